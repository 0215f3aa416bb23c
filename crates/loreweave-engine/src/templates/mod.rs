//! The built-in growth templates.

pub mod discovery;
pub mod faction_schism;
pub mod hero_emergence;
pub mod settlement_founding;

use crate::template::GrowthTemplate;

pub use discovery::EmergentDiscovery;
pub use faction_schism::FactionSchism;
pub use hero_emergence::HeroEmergence;
pub use settlement_founding::SettlementFounding;

/// The standard template registry, in registration order.
pub fn standard_templates() -> Vec<Box<dyn GrowthTemplate>> {
    vec![
        Box::new(HeroEmergence),
        Box::new(SettlementFounding),
        Box::new(FactionSchism),
        Box::new(EmergentDiscovery),
    ]
}
