pub mod cache;
pub mod extract;
pub mod parser;
pub mod resolver;

// Re-export main types and functions
pub use cache::{SubnetCache, SubnetSet};
pub use parser::{MechanismKind, MechanismSpec, parse_domain_specs};
pub use resolver::{Answer, DnsExchange, HickoryExchange, SpfResolver};
