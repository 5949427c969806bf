use std::collections::BTreeMap;

use crate::replay::{
    Attack, BaseDelta, EntityDelta, EntityId, EntityKind, Equipment, GaugeDelta, HistoryDelta,
    InventoryDelta, Item, MetricsDelta, SkillsDelta, StatusDelta,
};

use super::grid::GridCoord;
use super::projection::{GridProjector, Vec2};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profession {
    Melee,
    Range,
    Mage,
}

impl Profession {
    pub fn skill_key(self) -> &'static str {
        match self {
            Self::Melee => "melee",
            Self::Range => "range",
            Self::Mage => "mage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Passive,
    Neutral,
    Hostile,
}

impl Disposition {
    /// NPC names start with their disposition letter, e.g. `Hostile_-12`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.chars().next()? {
            'P' => Some(Self::Passive),
            'N' => Some(Self::Neutral),
            'H' => Some(Self::Hostile),
            _ => None,
        }
    }
}

/// Team portion of an agent name: everything before the last underscore.
pub fn derive_team_name(name: &str) -> &str {
    match name.rfind('_') {
        Some(index) => &name[..index],
        None => name,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusState {
    pub freeze: i32,
}

impl StatusState {
    fn merge(&mut self, delta: &StatusDelta) {
        if let Some(freeze) = delta.freeze {
            self.freeze = freeze;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SkillState {
    pub exp: f64,
    pub level: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillsState {
    pub level: i32,
    pub skills: BTreeMap<String, SkillState>,
}

impl SkillsState {
    fn merge(&mut self, delta: &SkillsDelta) {
        if let Some(level) = delta.level {
            self.level = level;
        }
        for (name, skill) in &delta.skills {
            let state = self.skills.entry(name.clone()).or_default();
            if let Some(exp) = skill.exp {
                state.exp = exp;
            }
            if let Some(level) = skill.level {
                state.level = level;
            }
        }
    }

    pub fn level_of(&self, skill: &str) -> i32 {
        self.skills.get(skill).map_or(0, |state| state.level)
    }

    /// Combat profession with the strictly highest level, if any.
    pub fn profession(&self) -> Option<Profession> {
        let mut best: Option<(Profession, i32)> = None;
        let mut tied = false;
        for profession in [Profession::Melee, Profession::Range, Profession::Mage] {
            let level = self.level_of(profession.skill_key());
            match best {
                Some((_, top)) if level == top => tied = true,
                Some((_, top)) if level < top => {}
                _ => {
                    best = Some((profession, level));
                    tied = false;
                }
            }
        }
        match best {
            Some((profession, level)) if level > 0 && !tied => Some(profession),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Gauge {
    pub val: f64,
    pub max: f64,
}

impl Gauge {
    /// Fill ratio in `[0, 1]`; zero when the gauge has no capacity.
    pub fn ratio(&self) -> f64 {
        if self.max > 0.0 {
            (self.val / self.max).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceGauges {
    pub gauges: BTreeMap<String, Gauge>,
}

impl ResourceGauges {
    fn merge(&mut self, delta: &BTreeMap<String, GaugeDelta>) {
        for (name, gauge) in delta {
            let state = self.gauges.entry(name.clone()).or_default();
            if let Some(val) = gauge.val {
                state.val = val;
            }
            if let Some(max) = gauge.max {
                state.max = max;
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Gauge> {
        self.gauges.get(name).copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryState {
    pub damage: f64,
    pub time_alive: i64,
    pub attack: Option<Attack>,
    pub actions: Option<serde_json::Value>,
}

impl HistoryState {
    fn merge(&mut self, delta: &HistoryDelta) {
        if let Some(damage) = delta.damage {
            self.damage = damage;
        }
        if let Some(time_alive) = delta.time_alive {
            self.time_alive = time_alive;
        }
        // Attack and actions describe the reported tick only.
        self.attack = delta.attack.clone();
        self.actions = delta.actions.clone();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryState {
    pub items: Vec<Item>,
    pub equipment: Equipment,
}

impl InventoryState {
    fn merge(&mut self, delta: &InventoryDelta) {
        if let Some(items) = &delta.items {
            self.items = items.clone();
        }
        if let Some(equipment) = &delta.equipment {
            self.equipment = equipment.clone();
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricsState {
    pub player_defeats: f64,
    pub time_alive: f64,
    pub gold: f64,
    pub damage_taken: f64,
}

impl MetricsState {
    fn merge(&mut self, delta: &MetricsDelta) {
        if let Some(value) = delta.player_defeats {
            self.player_defeats = value;
        }
        if let Some(value) = delta.time_alive {
            self.time_alive = value;
        }
        if let Some(value) = delta.gold {
            self.gold = value;
        }
        if let Some(value) = delta.damage_taken {
            self.damage_taken = value;
        }
    }
}

/// Persistent aggregate for one recorded agent.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityData {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    pub team: Option<String>,
    pub disposition: Option<Disposition>,
    pub color: Option<String>,
    pub population: Option<i32>,
    pub is_self: Option<i32>,
    pub level: i32,
    pub item_level: i32,
    pub row: Option<i32>,
    pub col: Option<i32>,
    pub prev_row: Option<i32>,
    pub prev_col: Option<i32>,
    pub alive: bool,
    pub removed: bool,
    pub facing: Facing,
    pub move_target: Option<Vec2>,
    pub status: StatusState,
    pub skills: SkillsState,
    pub resources: ResourceGauges,
    pub history: HistoryState,
    pub inventory: InventoryState,
    pub metrics: Option<MetricsState>,
}

impl EntityData {
    pub fn new(id: EntityId, kind: EntityKind) -> Self {
        Self {
            id,
            kind,
            name: String::new(),
            team: None,
            disposition: None,
            color: None,
            population: None,
            is_self: None,
            level: 0,
            item_level: 0,
            row: None,
            col: None,
            prev_row: None,
            prev_col: None,
            alive: false,
            removed: false,
            facing: Facing::default(),
            move_target: None,
            status: StatusState::default(),
            skills: SkillsState::default(),
            resources: ResourceGauges::default(),
            history: HistoryState::default(),
            inventory: InventoryState::default(),
            metrics: None,
        }
    }

    pub fn position(&self) -> Option<GridCoord> {
        Some(GridCoord::new(self.row?, self.col?))
    }

    pub fn previous_position(&self) -> Option<GridCoord> {
        Some(GridCoord::new(self.prev_row?, self.prev_col?))
    }

    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }

    pub fn profession(&self) -> Option<Profession> {
        self.skills.profession()
    }

    /// Merges every section present in `delta`; absent sections are untouched.
    pub fn apply(&mut self, delta: &EntityDelta, projector: &GridProjector) {
        if let Some(base) = &delta.base {
            self.merge_base(base);
        }
        if let Some(alive) = delta.alive() {
            self.alive = alive;
        }
        if let Some(status) = &delta.status {
            self.status.merge(status);
        }
        if let Some(skills) = &delta.skills {
            self.skills.merge(skills);
        }
        if let Some(resource) = &delta.resource {
            self.resources.merge(resource);
        }
        if let Some(history) = &delta.history {
            self.history.merge(history);
        }
        if let Some(inventory) = &delta.inventory {
            self.inventory.merge(inventory);
        }
        if let Some(metrics) = &delta.metrics {
            self.metrics.get_or_insert_with(MetricsState::default).merge(metrics);
        }
        self.update_motion(projector);
    }

    /// Drops any pending move so the entity rests on its current cell.
    pub fn settle(&mut self) {
        self.prev_row = self.row;
        self.prev_col = self.col;
        self.move_target = None;
    }

    fn merge_base(&mut self, base: &BaseDelta) {
        let placed = self.row.is_some();
        if placed {
            self.prev_row = self.row;
            self.prev_col = self.col;
        }
        if let Some(row) = base.r {
            self.row = Some(row);
        }
        if let Some(col) = base.c {
            self.col = Some(col);
        }
        // First placement is not a move.
        if !placed {
            self.prev_row = self.row;
            self.prev_col = self.col;
        }

        if let Some(name) = &base.name {
            self.name = name.clone();
            match self.kind {
                EntityKind::Player => self.team = Some(derive_team_name(name).to_string()),
                EntityKind::Npc => self.disposition = Disposition::from_name(name),
            }
        }
        if let Some(color) = &base.color {
            self.color = Some(color.clone());
        }
        if let Some(population) = base.population {
            self.population = Some(population);
        }
        if let Some(is_self) = base.is_self {
            self.is_self = Some(is_self);
        }
        if let Some(level) = base.level {
            self.level = level;
        }
        if let Some(item_level) = base.item_level {
            self.item_level = item_level;
        }
    }

    fn update_motion(&mut self, projector: &GridProjector) {
        let current = self.position();
        if current != self.previous_position() {
            self.move_target = current.map(|coord| projector.tile_origin(coord));
        } else {
            self.move_target = None;
        }
        if let (Some(col), Some(prev_col)) = (self.col, self.prev_col) {
            if col != prev_col {
                self.facing = if col > prev_col {
                    Facing::Right
                } else {
                    Facing::Left
                };
            }
        }
    }
}
