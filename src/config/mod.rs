//! Configuration collaborator: parsed nodes, plugins, named appenders and
//! variable substitution

pub mod configuration;
pub mod node;
pub mod plugins;
pub mod substitutor;

pub use configuration::Configuration;
pub use node::Node;
pub use plugins::{build_filters, build_layout, AppenderFactory, PluginRegistry};
pub use substitutor::{
    ContextMapLookup, DateLookup, EnvironmentLookup, EventLookup, MainMapLookup, MarkerLookup,
    StrLookup, StrSubstitutor,
};
