mod tcp_link;

pub use tcp_link::TcpReachabilityLink;
