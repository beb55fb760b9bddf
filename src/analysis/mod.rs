pub mod pockets;
