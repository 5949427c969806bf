use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde_json::json;

use super::*;
use crate::config::{InitError, ReplayConfig};
use crate::replay::{EntityId, Replay};

const TICK: Duration = Duration::from_millis(600);
const DUE: Duration = Duration::from_millis(601);

fn replay(value: serde_json::Value) -> Replay {
    serde_json::from_value(value).expect("replay")
}

fn world(value: serde_json::Value) -> ReplayWorld {
    ReplayWorld::init(replay(value), ReplayConfig::default()).expect("world")
}

fn record_events(world: &mut ReplayWorld) -> Rc<RefCell<Vec<String>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    world.add_listener(move |event: &ReplayEvent<'_>| {
        let label = match event {
            ReplayEvent::PacketChanged { step, .. } => format!("packet:{step}"),
            ReplayEvent::StepChanged(step) => format!("step:{step}"),
            ReplayEvent::EntityRemoved(id) => format!("removed:{id}"),
            ReplayEvent::TeamAdded(team) => format!("team:{team}"),
            ReplayEvent::TeamSelected(team) => format!("selected:{team}"),
            ReplayEvent::LookAtChanged(Some(id)) => format!("look:{id}"),
            ReplayEvent::LookAtChanged(None) => "look:none".to_string(),
            ReplayEvent::PlaybackEnded => "ended".to_string(),
        };
        sink.borrow_mut().push(label);
    });
    events
}

fn three_step_replay() -> serde_json::Value {
    json!({
        "map": [[1, 2], [5, 3]],
        "packets": [
            { "player": { "1": { "alive": true, "base": { "r": 0, "c": 0, "name": "Neural_1", "population": 0 } } } },
            { "player": { "1": { "base": { "r": 0, "c": 1 } } } },
            { "player": { "1": { "base": { "r": 1, "c": 1 } } } }
        ]
    })
}

#[test]
fn single_water_tile_scenario() {
    let mut world = world(json!({
        "map": [[1]],
        "packets": [
            { "player": { "1": { "base": { "r": 0, "c": 0, "alive": true } } } }
        ]
    }));
    assert!(world.advance(DUE));
    let entity = world.entity(EntityId(1)).expect("entity");
    assert_eq!(entity.row, Some(0));
    assert_eq!(entity.col, Some(0));
    assert!(entity.alive);
    assert!(world.resources().active().is_empty());
    assert!(world.resources().inactive().is_empty());
}

#[test]
fn flat_packet_entries_are_accepted() {
    let mut world = world(json!({
        "map": [[1]],
        "packets": [
            { "1": { "base": { "r": 0, "c": 0, "alive": true } }, "resource_depleted": [] }
        ]
    }));
    assert!(world.advance(DUE));
    assert!(world.entity(EntityId(1)).expect("entity").is_player());
}

#[test]
fn playing_every_packet_ends_paused() {
    let mut world = world(three_step_replay());
    let events = record_events(&mut world);
    for _ in 0..3 {
        assert!(world.advance(DUE));
    }
    let playback = world.playback();
    assert!(playback.paused);
    assert!(playback.ended);
    assert_eq!(playback.step_index, 3);
    assert_eq!(world.phase(), PlaybackPhase::Ended);
    assert!(!world.advance(DUE));
    assert_eq!(
        events.borrow().as_slice(),
        [
            "packet:0", "step:0", "team:Neural", "packet:1", "step:1", "packet:2", "step:2",
            "ended"
        ]
    );
}

#[test]
fn clock_waits_for_a_full_tick() {
    let mut world = world(three_step_replay());
    assert!(!world.advance(TICK));
    assert_eq!(world.playback().step_index, 0);
    assert!(world.advance(Duration::from_millis(1)));
    assert_eq!(world.playback().step_index, 1);
}

#[test]
fn resuming_at_the_end_restarts_from_zero() {
    let mut world = world(three_step_replay());
    for _ in 0..3 {
        world.advance(DUE);
    }
    world.resume();
    let events = record_events(&mut world);
    assert!(world.advance(DUE));
    assert_eq!(events.borrow()[0], "packet:0");
    let playback = world.playback();
    assert_eq!(playback.step_index, 1);
    assert!(!playback.ended);
    assert!(!playback.paused);
}

#[test]
fn paused_world_does_not_tick() {
    let mut world = world(three_step_replay());
    assert!(world.toggle_pause());
    assert!(!world.advance(Duration::from_secs(5)));
    assert_eq!(world.playback().step_index, 0);
    assert!(!world.toggle_pause());
    assert!(world.advance(DUE));
}

#[test]
fn empty_recording_is_a_no_op() {
    let mut world = world(json!({ "map": [[1]], "packets": [] }));
    assert!(!world.advance(Duration::from_secs(60)));
    assert_eq!(world.seek(3), None);
    assert_eq!(world.playback().step_index, 0);
}

#[test]
fn depletion_then_regeneration_across_ticks() {
    let mut world = world(json!({
        "map": [[5]],
        "packets": [
            { "resource": [[0, 0]] },
            { "resource": [] }
        ]
    }));
    let key = GridCoord::new(0, 0);
    assert!(world.resources().is_active(key));
    world.advance(DUE);
    assert!(world.resources().is_inactive(key));
    world.advance(DUE);
    assert!(world.resources().is_active(key));
    assert_eq!(key.to_string(), "0_0");
}

#[test]
fn omitted_skills_keep_previous_state() {
    let mut world = world(json!({
        "map": [[1]],
        "packets": [
            { "player": { "1": { "skills": { "melee": { "exp": 40, "level": 3 } } } } },
            { "player": { "1": { "base": { "r": 0, "c": 0 } } } }
        ]
    }));
    world.advance(DUE);
    let before = world.entity(EntityId(1)).expect("entity").skills.clone();
    world.advance(DUE);
    let after = &world.entity(EntityId(1)).expect("entity").skills;
    assert_eq!(after, &before);
    assert_eq!(after.level_of("melee"), 3);
}

#[test]
fn first_appearance_is_not_a_move() {
    let mut world = world(three_step_replay());
    world.advance(DUE);
    let entity = world.entity(EntityId(1)).expect("entity");
    assert_eq!(entity.previous_position(), entity.position());
    assert_eq!(entity.move_target, None);

    world.advance(DUE);
    let entity = world.entity(EntityId(1)).expect("entity");
    assert_eq!(entity.previous_position(), Some(GridCoord::new(0, 0)));
    assert_eq!(
        entity.move_target,
        Some(world.context().projector().tile_origin(GridCoord::new(0, 1)))
    );
    assert_eq!(entity.facing, Facing::Right);
}

#[test]
fn malformed_entries_do_not_stop_the_tick() {
    let mut world = world(json!({
        "map": [[1]],
        "packets": [
            {
                "player": { "1": { "base": { "r": 0, "c": 0 } }, "x": {} },
                "0": { "alive": true }
            }
        ]
    }));
    assert!(world.advance(DUE));
    assert!(world.entity(EntityId(1)).is_some());
    assert!(world.entity(EntityId(0)).is_none());
    assert_eq!(world.entities().len(), 1);
}

#[test]
fn missing_terrain_mapping_fails_init() {
    let err = ReplayWorld::init(
        replay(json!({ "map": [[1, 99], [1, 1]], "packets": [] })),
        ReplayConfig::default(),
    )
    .expect_err("unmapped code");
    match err {
        InitError::MissingMapping(missing) => {
            assert_eq!(missing.code, 99);
            assert_eq!(missing.coord, GridCoord::new(0, 1));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn absent_entities_are_removed_and_drop_the_follow() {
    let mut world = world(json!({
        "map": [[1, 1], [1, 1]],
        "packets": [
            { "player": {
                "1": { "alive": true, "base": { "r": 0, "c": 0 } },
                "2": { "alive": true, "base": { "r": 1, "c": 1 } }
            } },
            { "player": { "1": {} } },
            { "player": { "1": {} } }
        ]
    }));
    world.advance(DUE);
    let events = record_events(&mut world);
    assert!(world.set_followed_entity(Some(EntityId(2))));
    world.advance(DUE);
    world.advance(DUE);
    assert_eq!(world.viewport().followed, None);
    assert!(world.entity(EntityId(2)).expect("entity").removed);
    assert_eq!(world.draw_order(), vec![EntityId(1)]);
    assert_eq!(
        events.borrow().as_slice(),
        [
            "look:2",
            "packet:1",
            "step:1",
            "removed:2",
            "look:none",
            "packet:2",
            "step:2",
            "ended"
        ]
    );
}

#[test]
fn seek_dispatches_clamped_step() {
    let mut world = world(three_step_replay());
    let events = record_events(&mut world);
    assert_eq!(world.seek(1), Some(1));
    assert_eq!(world.playback().step_index, 2);
    assert_eq!(
        world.entity(EntityId(1)).expect("entity").position(),
        Some(GridCoord::new(0, 1))
    );
    assert_eq!(world.seek(99), Some(2));
    assert!(world.playback().ended);
    assert_eq!(
        events.borrow().as_slice(),
        ["packet:1", "step:1", "packet:2", "step:2", "ended"]
    );
}

#[test]
fn following_snaps_camera_to_target() {
    let mut world = world(json!({
        "map": vec![vec![1; 40]; 40],
        "packets": [
            { "player": { "7": { "alive": true, "base": { "r": 30, "c": 2 } } } },
            { "player": { "7": { "alive": true, "base": { "r": 30, "c": 3 } } } }
        ]
    }));
    world.advance(DUE);
    world.set_followed_entity(Some(EntityId(7)));
    let target = world
        .context()
        .projector()
        .tile_origin(GridCoord::new(30, 2))
        * -1.0;
    assert_eq!(world.viewport().position, target);

    world.drag_by(Vec2::new(5.0, 5.0));
    assert_eq!(world.viewport().followed, None);
}

#[test]
fn speed_scales_effective_tick() {
    let mut world = world(three_step_replay());
    assert_eq!(world.adjust_speed(SpeedChange::Faster), 2.0);
    assert_eq!(world.effective_tick(), Duration::from_millis(300));
    assert!(world.advance(Duration::from_millis(301)));
}

#[test]
fn teams_are_selectable_and_ranked() {
    let mut world = world(json!({
        "map": [[1]],
        "packets": [
            { "player": {
                "1": { "base": { "name": "Red_1", "population": 0 }, "metrics": { "TimeAlive": 5 } },
                "2": { "base": { "name": "Blue_2", "population": 1 }, "metrics": { "TimeAlive": 9 } }
            } }
        ],
        "metrics": { "AliveScore": { "0": 20.0, "1": 3.0 } }
    }));
    let events = record_events(&mut world);
    assert!(world.advance(DUE));
    assert!(world.select_team("Red"));
    assert!(!world.select_team("Green"));
    assert_eq!(world.selected_team(), Some("Red"));
    assert!(events.borrow().contains(&"selected:Red".to_string()));

    // Ended: recorded final metrics take over from live values.
    let standings = world.standings();
    assert!(standings[0].is_final);
    assert_eq!(standings[0].team, "Red");
    assert_eq!(standings[0].rank, 1);
    assert_eq!(standings[1].team, "Blue");
}

#[test]
fn packet_border_and_fog_config_apply() {
    let mut world = world(json!({
        "map": vec![vec![1; 10]; 10],
        "packets": [
            { "border": 1, "config": { "PLAYER_DEATH_FOG": 0, "PLAYER_DEATH_FOG_SPEED": 1.0, "PLAYER_DEATH_FOG_FINAL_SIZE": 1 } },
            { "border": 1 }
        ]
    }));
    world.advance(DUE);
    assert_eq!(world.border_size(), 1);
    assert!(world.fog().is_active());
    assert_eq!(world.fog().fog_step(), 1);
    assert_eq!(world.fog().safe_zone(), SafeZone { min: 2, max: 7 });

    // The second packet carries no config; the earlier override still holds.
    world.advance(DUE);
    assert_eq!(world.border_size(), 1);
    assert_eq!(world.fog().config().start_step, 0);
    assert!(world.fog().is_active());
    assert_eq!(world.fog().fog_step(), 2);
    assert_eq!(world.fog().safe_zone(), SafeZone { min: 3, max: 6 });
}

#[test]
fn follow_waits_for_minimum_zoom() {
    let mut world = world(json!({
        "map": vec![vec![1; 40]; 40],
        "packets": [
            { "player": { "7": { "alive": true, "base": { "r": 30, "c": 2 } } } },
            { "player": { "7": { "alive": true, "base": { "r": 30, "c": 2 } } } }
        ]
    }));
    world.advance(DUE);
    assert!(world.set_zoom_step(-5));
    assert_eq!(world.viewport().zoom_index, 0);
    assert!(world.set_followed_entity(Some(EntityId(7))));
    assert_eq!(world.viewport().position, Vec2::ZERO);

    assert!(world.set_zoom_step(1));
    world.advance(Duration::from_secs(1));
    assert_ne!(world.viewport().position, Vec2::ZERO);
}

#[test]
fn seeking_backwards_does_not_animate_a_move() {
    let mut world = world(three_step_replay());
    for _ in 0..3 {
        world.advance(DUE);
    }
    assert_eq!(world.seek(0), Some(0));
    let entity = world.entity(EntityId(1)).expect("entity");
    assert_eq!(entity.position(), Some(GridCoord::new(0, 0)));
    assert_eq!(entity.previous_position(), entity.position());
    assert_eq!(entity.move_target, None);

    world.resume();
    assert!(world.advance(DUE));
    let entity = world.entity(EntityId(1)).expect("entity");
    assert_eq!(entity.previous_position(), Some(GridCoord::new(0, 0)));
    assert_eq!(
        entity.move_target,
        Some(world.context().projector().tile_origin(GridCoord::new(0, 1)))
    );
}
