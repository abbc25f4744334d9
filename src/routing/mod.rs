pub mod instance_key;
pub mod resolver;

pub use instance_key::SourceInstanceKey;
pub use resolver::InstanceResolver;
