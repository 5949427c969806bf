use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::replay::{EntityId, FinalMetrics};

use super::entity::EntityData;
use super::reconcile::EntityReconciler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub name: String,
    pub population: Option<i32>,
    pub members: BTreeSet<EntityId>,
}

/// Player teams keyed by derived team name, in registration order.
#[derive(Debug, Clone, Default)]
pub struct TeamRegistry {
    teams: Vec<Team>,
    by_name: BTreeMap<String, usize>,
}

impl TeamRegistry {
    /// Adds `entity` to its team. Returns the team name when this entity is
    /// the first member and the team was just registered.
    pub fn observe(&mut self, entity: &EntityData) -> Option<String> {
        if !entity.is_player() {
            return None;
        }
        let name = entity.team.as_deref()?;
        if let Some(&index) = self.by_name.get(name) {
            let team = &mut self.teams[index];
            team.members.insert(entity.id);
            if team.population.is_none() {
                team.population = entity.population;
            }
            return None;
        }
        self.by_name.insert(name.to_string(), self.teams.len());
        self.teams.push(Team {
            name: name.to_string(),
            population: entity.population,
            members: BTreeSet::from([entity.id]),
        });
        Some(name.to_string())
    }

    pub fn by_name(&self, name: &str) -> Option<&Team> {
        self.by_name.get(name).map(|&index| &self.teams[index])
    }

    pub fn by_population(&self, population: i32) -> Option<&Team> {
        self.teams
            .iter()
            .find(|team| team.population == Some(population))
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Ranks every team by `defeat_score + alive_score`, best first.
    ///
    /// `final_metrics` is only consulted once playback has ended; before that
    /// the live per-agent metrics are aggregated.
    pub fn standings(
        &self,
        entities: &EntityReconciler,
        final_metrics: Option<&FinalMetrics>,
    ) -> Vec<Standing> {
        let mut standings = self
            .teams
            .iter()
            .map(|team| match final_metrics {
                Some(metrics) => Standing::from_final(team, metrics),
                None => Standing::from_live(team, entities),
            })
            .collect::<Vec<_>>();
        standings.sort_by(|left, right| {
            right
                .score
                .partial_cmp(&left.score)
                .unwrap_or(Ordering::Equal)
        });
        for (index, standing) in standings.iter_mut().enumerate() {
            standing.rank = index + 1;
        }
        standings
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    pub rank: usize,
    pub team: String,
    pub alive_score: f64,
    pub defeat_score: f64,
    pub gold: f64,
    pub damage_taken: f64,
    pub score: f64,
    pub is_final: bool,
}

impl Standing {
    fn new(team: &Team, alive: f64, defeat: f64, gold: f64, damage: f64, is_final: bool) -> Self {
        Self {
            rank: 0,
            team: team.name.clone(),
            alive_score: alive,
            defeat_score: defeat,
            gold,
            damage_taken: damage,
            score: defeat + alive,
            is_final,
        }
    }

    fn from_final(team: &Team, metrics: &FinalMetrics) -> Self {
        let lookup = |scores: &BTreeMap<i32, f64>| {
            team.population
                .and_then(|population| scores.get(&population).copied())
                .unwrap_or(0.0)
        };
        Self::new(
            team,
            lookup(&metrics.alive_score),
            lookup(&metrics.defeat_score),
            lookup(&metrics.gold),
            lookup(&metrics.damage_taken),
            true,
        )
    }

    fn from_live(team: &Team, entities: &EntityReconciler) -> Self {
        let mut alive = 0.0_f64;
        let mut defeats = 0.0;
        let mut gold = 0.0;
        let mut damage = 0.0;
        for metrics in team
            .members
            .iter()
            .filter_map(|&id| entities.get(id))
            .filter_map(|entity| entity.metrics)
        {
            alive = alive.max(metrics.time_alive);
            defeats += metrics.player_defeats;
            gold += metrics.gold;
            damage += metrics.damage_taken;
        }
        Self::new(team, alive, defeats / 2.0, gold, damage, false)
    }
}
