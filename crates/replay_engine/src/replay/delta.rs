use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One entity's incremental update for a tick. Every section is optional and
/// an absent section means "no change this tick".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<BaseDelta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusDelta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<SkillsDelta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<BTreeMap<String, GaugeDelta>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<HistoryDelta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<InventoryDelta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsDelta>,
}

impl EntityDelta {
    /// `alive` may be reported at entry level or inside `base`; entry level wins.
    pub fn alive(&self) -> Option<bool> {
        self.alive
            .or_else(|| self.base.as_ref().and_then(|base| base.alive))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseDelta {
    pub r: Option<i32>,
    pub c: Option<i32>,
    pub name: Option<String>,
    pub color: Option<String>,
    pub population: Option<i32>,
    #[serde(rename = "self")]
    pub is_self: Option<i32>,
    pub level: Option<i32>,
    pub item_level: Option<i32>,
    pub alive: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusDelta {
    pub freeze: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillsDelta {
    #[serde(default)]
    pub level: Option<i32>,
    #[serde(flatten)]
    pub skills: BTreeMap<String, SkillDelta>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillDelta {
    pub exp: Option<f64>,
    pub level: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaugeDelta {
    pub val: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryDelta {
    pub damage: Option<f64>,
    #[serde(rename = "timeAlive")]
    pub time_alive: Option<i64>,
    pub attack: Option<Attack>,
    pub actions: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attack {
    pub target: i64,
    pub style: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryDelta {
    pub items: Option<Vec<Item>>,
    pub equipment: Option<Equipment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub color: Option<String>,
    pub item: String,
    pub level: i32,
    pub capacity: i32,
    pub quantity: i32,
    pub melee_attack: f64,
    pub range_attack: f64,
    pub mage_attack: f64,
    pub melee_defense: f64,
    pub range_defense: f64,
    pub mage_defense: f64,
    pub health_restore: f64,
    pub resource_restore: f64,
    pub price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Equipment {
    pub item_level: i32,
    #[serde(alias = "meleee_attack")]
    pub melee_attack: f64,
    pub range_attack: f64,
    pub mage_attack: f64,
    #[serde(alias = "meleee_defense")]
    pub melee_defense: f64,
    pub range_defense: f64,
    pub mage_defense: f64,
    pub held: Option<Item>,
    pub hat: Option<Item>,
    pub top: Option<Item>,
    pub bottom: Option<Item>,
    pub ammunition: Option<Item>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsDelta {
    #[serde(rename = "PlayerDefeats")]
    pub player_defeats: Option<f64>,
    #[serde(rename = "TimeAlive")]
    pub time_alive: Option<f64>,
    #[serde(rename = "Gold")]
    pub gold: Option<f64>,
    #[serde(rename = "DamageTaken")]
    pub damage_taken: Option<f64>,
}
