pub mod pool;
pub mod registry_client;

pub use registry_client::RegistryClient;
