pub mod file_persister;
pub mod http_gateway;

pub use file_persister::FilePersister;
pub use http_gateway::HttpAuthGateway;
