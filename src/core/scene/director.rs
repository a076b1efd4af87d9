//=========================================================================
// Scene Director
//=========================================================================
//
// Single authority over which presentation units run and are visible.
//
// Layers and depths:
//   primary   (one at a time, historied)       depth = primary
//   companion (at most one visible)            depth = companion
//   popups    (stacked, modal)                 depth = popup + index
//
// changeScene ordering:
//   1. close every popup
//   2. hide the outgoing companion (when the target wants another one)
//   3. stop the outgoing primary and cancel its timers
//   4. push the outgoing record, start the target
//   5. show the target's companion, update the current biome
//
// Nothing of the outgoing scene is alive when the target's on_enter runs.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, error, info, warn};

//=== Internal Dependencies ===============================================

use super::{Layer, NavigationRequest, SceneEntry, UnitDescriptor, UnitStatus};
use crate::core::error::{GameError, GameResult};
use crate::core::globals::GameContext;
use crate::core::input::InputEvent;
use crate::core::scheduler::{FiredTimer, TimerScope};
use crate::core::scene::Scene;
use crate::events::NavigationEvent;

/// Request rounds applied per tick; requests raised beyond this wait.
const MAX_REQUEST_ROUNDS: usize = 8;

//=== SceneRecord =========================================================

/// One navigation history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneRecord {
    pub scene_key: String,
    pub reference: Option<String>,
}

//=== Unit ================================================================

struct Unit {
    layer: Layer,
    scene: Box<dyn Scene>,
    status: UnitStatus,
}

//=== SceneDirector =======================================================

pub struct SceneDirector {
    units: HashMap<String, Unit>,
    current: Option<SceneRecord>,
    /// Bumped on every primary entry; scopes that entry's timers.
    generation: u64,
    history: Vec<SceneRecord>,
    companion: Option<String>,
    /// Visible popups, bottom → top.
    popups: Vec<String>,
    popup_history: Vec<String>,
    biome: Option<String>,
}

impl Default for SceneDirector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SceneDirector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneDirector")
            .field("current", &self.current)
            .field("history", &self.history)
            .field("companion", &self.companion)
            .field("popups", &self.popups)
            .finish_non_exhaustive()
    }
}

impl SceneDirector {
    //--- Construction -----------------------------------------------------

    pub fn new() -> Self {
        Self {
            units: HashMap::new(),
            current: None,
            generation: 0,
            history: Vec::new(),
            companion: None,
            popups: Vec::new(),
            popup_history: Vec::new(),
            biome: None,
        }
    }

    //--- Registration -----------------------------------------------------

    /// Registers a unit. Re-registering a key is a no-op.
    pub fn register(&mut self, key: &str, descriptor: UnitDescriptor) -> bool {
        if self.units.contains_key(key) {
            warn!("Unit {} is already registered, keeping the first", key);
            return false;
        }
        debug!("Registered {:?} unit {}", descriptor.layer, key);
        self.units.insert(
            key.to_string(),
            Unit {
                layer: descriptor.layer,
                scene: descriptor.scene,
                status: UnitStatus::Stopped,
            },
        );
        true
    }

    /// Registers a batch of units.
    pub fn register_units<K: AsRef<str>>(&mut self, units: impl IntoIterator<Item = (K, UnitDescriptor)>) {
        for (key, descriptor) in units {
            self.register(key.as_ref(), descriptor);
        }
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.units.contains_key(key)
    }

    //--- Queries ----------------------------------------------------------

    pub fn current(&self) -> Option<&SceneRecord> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &[SceneRecord] {
        &self.history
    }

    pub fn companion(&self) -> Option<&str> {
        self.companion.as_deref()
    }

    pub fn active_popups(&self) -> &[String] {
        &self.popups
    }

    pub fn popup_history(&self) -> &[String] {
        &self.popup_history
    }

    pub fn current_biome(&self) -> Option<&str> {
        self.biome.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn status(&self, key: &str) -> Option<UnitStatus> {
        self.units.get(key).map(|u| u.status)
    }

    //--- Primary Navigation -----------------------------------------------

    /// Enters the first primary scene without recording history.
    pub fn start(&mut self, ctx: &mut GameContext, target: &str, reference: Option<&str>) -> GameResult<()> {
        let record = self.resolve(ctx, target, reference)?;
        info!("Starting at scene {}", record.scene_key);

        self.close_all_popups(ctx);
        self.exit_primary(ctx);
        self.enter_primary(ctx, &record)?;
        self.apply_scene_meta(ctx, &record);
        ctx.outbox.publish(NavigationEvent::SceneChanged {
            from: None,
            to: record.scene_key,
            reference: record.reference,
        });
        Ok(())
    }

    /// Replaces the primary scene, recording the outgoing one.
    ///
    /// Returns `false` for a no-op change to the current key+reference.
    pub fn change_scene(
        &mut self,
        ctx: &mut GameContext,
        target: &str,
        reference: Option<&str>,
    ) -> GameResult<bool> {
        let record = self.resolve(ctx, target, reference)?;
        if self.current.as_ref() == Some(&record) {
            debug!("Already in {} ({:?}), ignoring change", record.scene_key, record.reference);
            return Ok(false);
        }

        self.check_entry(ctx, &record)?;

        let previous = self.current.clone();
        self.teardown_for(ctx, &record);
        if let Some(prev) = &previous {
            self.history.push(prev.clone());
        }

        if let Err(e) = self.enter_primary(ctx, &record) {
            error!("Could not enter {}: {}", record.scene_key, e);
            if previous.is_some() {
                self.history.pop();
            }
            self.restore(ctx, previous);
            return Err(e);
        }

        info!("Scene changed to {} ({:?})", record.scene_key, record.reference);
        self.apply_scene_meta(ctx, &record);
        ctx.outbox.publish(NavigationEvent::SceneChanged {
            from: previous.map(|p| p.scene_key),
            to: record.scene_key,
            reference: record.reference,
        });
        Ok(true)
    }

    /// Returns to the most recent history entry without recording one.
    ///
    /// Returns `false` when the history is empty.
    pub fn go_back(&mut self, ctx: &mut GameContext) -> GameResult<bool> {
        let Some(record) = self.history.pop() else {
            warn!("goBack with empty history, staying put");
            ctx.outbox.publish(NavigationEvent::BackIgnored);
            return Ok(false);
        };

        if let Err(e) = self.check_entry(ctx, &record) {
            self.history.push(record);
            return Err(e);
        }

        let previous = self.current.clone();
        self.teardown_for(ctx, &record);

        if let Err(e) = self.enter_primary(ctx, &record) {
            error!("Could not go back to {}: {}", record.scene_key, e);
            self.history.push(record);
            self.restore(ctx, previous);
            return Err(e);
        }

        info!("Went back to {} ({:?})", record.scene_key, record.reference);
        self.apply_scene_meta(ctx, &record);
        ctx.outbox.publish(NavigationEvent::WentBack {
            to: record.scene_key,
        });
        Ok(true)
    }

    fn resolve(&self, ctx: &GameContext, target: &str, reference: Option<&str>) -> GameResult<SceneRecord> {
        let data = Rc::clone(&ctx.data);
        let resolved = data.resolve_scene(target, reference).map_err(|e| {
            warn!("changeScene({}, {:?}) abandoned: {}", target, reference, e);
            e
        })?;
        let record = SceneRecord {
            scene_key: resolved.meta.key.clone(),
            reference: resolved.reference,
        };
        self.require_layer(&record.scene_key, Layer::Primary)?;
        Ok(record)
    }

    /// Asks the target unit whether it accepts the entry while the current
    /// scene is still running.
    fn check_entry(&self, ctx: &GameContext, record: &SceneRecord) -> GameResult<()> {
        let unit = self
            .units
            .get(&record.scene_key)
            .ok_or_else(|| GameError::not_found("scene unit", &record.scene_key))?;
        let entry = SceneEntry {
            key: record.scene_key.clone(),
            reference: record.reference.clone(),
            scope: TimerScope::Scene(self.generation + 1),
            depth: ctx.config.depths.primary,
        };
        unit.scene.can_enter(ctx, &entry).map_err(|e| {
            warn!("{} ({:?}) refused entry: {}", record.scene_key, record.reference, e);
            e
        })
    }

    /// Clears popups, hides a companion the target does not use, stops
    /// the current primary.
    fn teardown_for(&mut self, ctx: &mut GameContext, target: &SceneRecord) {
        self.close_all_popups(ctx);
        let wanted = companion_of(ctx, &target.scene_key);
        if wanted != self.companion {
            self.hide_companions(ctx, None);
        }
        self.exit_primary(ctx);
    }

    /// Re-enters the scene that was current before a failed transition.
    fn restore(&mut self, ctx: &mut GameContext, previous: Option<SceneRecord>) {
        let Some(previous) = previous else {
            return;
        };
        match self.enter_primary(ctx, &previous) {
            Ok(()) => self.apply_scene_meta(ctx, &previous),
            Err(e) => error!("Could not restore {}: {}", previous.scene_key, e),
        }
    }

    fn enter_primary(&mut self, ctx: &mut GameContext, record: &SceneRecord) -> GameResult<()> {
        self.generation += 1;
        let entry = SceneEntry {
            key: record.scene_key.clone(),
            reference: record.reference.clone(),
            scope: TimerScope::Scene(self.generation),
            depth: ctx.config.depths.primary,
        };
        let unit = self
            .units
            .get_mut(&record.scene_key)
            .ok_or_else(|| GameError::not_found("scene unit", &record.scene_key))?;

        unit.status = UnitStatus::Running { visible: true };
        ctx.presenter.present_unit(&entry.key, true, entry.depth);

        if let Err(e) = unit.scene.on_enter(ctx, &entry) {
            unit.scene.on_exit(ctx);
            unit.status = UnitStatus::Stopped;
            ctx.scheduler.cancel_scene(self.generation);
            ctx.presenter.present_unit(&entry.key, false, entry.depth);
            return Err(e);
        }

        self.current = Some(record.clone());
        Ok(())
    }

    fn exit_primary(&mut self, ctx: &mut GameContext) {
        let Some(record) = self.current.take() else {
            return;
        };
        if let Some(unit) = self.units.get_mut(&record.scene_key) {
            unit.scene.on_exit(ctx);
            unit.status = UnitStatus::Stopped;
        }
        ctx.scheduler.cancel_scene(self.generation);
        ctx.presenter
            .present_unit(&record.scene_key, false, ctx.config.depths.primary);
        debug!("Stopped scene {}", record.scene_key);
    }

    fn apply_scene_meta(&mut self, ctx: &mut GameContext, record: &SceneRecord) {
        let data = Rc::clone(&ctx.data);
        let Some(meta) = data.scene(&record.scene_key) else {
            return;
        };

        if let Err(e) = self.update_companion_ui(ctx, meta.companion_ui.as_deref()) {
            warn!("Companion UI for {} unavailable: {}", record.scene_key, e);
        }

        if let Some(biome) = &meta.biome_id {
            if self.biome.as_ref() != Some(biome) {
                debug!("Current biome is now {}", biome);
                self.biome = Some(biome.clone());
                ctx.outbox.publish(NavigationEvent::BiomeChanged(biome.clone()));
            }
        }
    }

    //--- Companion UI -----------------------------------------------------

    /// Shows `target` as the only visible companion layer, or hides every
    /// companion layer for `None`.
    pub fn update_companion_ui(&mut self, ctx: &mut GameContext, target: Option<&str>) -> GameResult<()> {
        let Some(key) = target else {
            if self.companion.is_some() {
                self.hide_companions(ctx, None);
                ctx.outbox.publish(NavigationEvent::CompanionChanged(None));
            }
            return Ok(());
        };

        self.require_layer(key, Layer::Companion)?;
        let depth = ctx.config.depths.companion;

        if self.companion.as_deref() == Some(key) {
            return self.show_unit(ctx, key, depth);
        }

        self.hide_companions(ctx, Some(key));
        self.show_unit(ctx, key, depth)?;
        self.companion = Some(key.to_string());
        ctx.outbox
            .publish(NavigationEvent::CompanionChanged(Some(key.to_string())));
        Ok(())
    }

    fn hide_companions(&mut self, ctx: &mut GameContext, except: Option<&str>) {
        let depth = ctx.config.depths.companion;
        for (key, unit) in self.units.iter_mut() {
            if unit.layer != Layer::Companion || Some(key.as_str()) == except {
                continue;
            }
            if unit.status.is_visible() {
                unit.status = match unit.status {
                    UnitStatus::Paused { .. } => UnitStatus::Paused { visible: false },
                    _ => UnitStatus::Running { visible: false },
                };
                unit.scene.on_visibility(ctx, false);
                ctx.presenter.present_unit(key, false, depth);
            }
        }
        if except.is_none() || self.companion.as_deref() != except {
            self.companion = None;
        }
    }

    //--- Popups -----------------------------------------------------------

    /// Launches a popup if absent, or shows it again if hidden. The popup
    /// is stacked above every other visible popup.
    pub fn show_popup(&mut self, ctx: &mut GameContext, key: &str) -> GameResult<()> {
        self.require_layer(key, Layer::Popup)?;
        if self.popups.iter().any(|k| k == key) {
            debug!("Popup {} already visible", key);
            return Ok(());
        }

        let depth = ctx.config.depths.popup + self.popups.len() as i32;
        self.show_unit(ctx, key, depth)?;
        self.popups.push(key.to_string());
        self.popup_history.push(key.to_string());

        debug!("Popup {} shown at depth {}", key, depth);
        ctx.outbox.publish(NavigationEvent::PopupShown(key.to_string()));
        Ok(())
    }

    /// Hides a visible popup, keeping its state for the next show.
    pub fn hide_popup(&mut self, ctx: &mut GameContext, key: &str) -> GameResult<()> {
        self.require_layer(key, Layer::Popup)?;
        let Some(pos) = self.popups.iter().position(|k| k == key) else {
            debug!("Popup {} is not visible", key);
            return Ok(());
        };

        self.popups.remove(pos);
        if let Some(h) = self.popup_history.iter().rposition(|k| k == key) {
            self.popup_history.remove(h);
        }

        if let Some(unit) = self.units.get_mut(key) {
            if let UnitStatus::Running { .. } = unit.status {
                unit.status = UnitStatus::Running { visible: false };
            }
            unit.scene.on_visibility(ctx, false);
        }
        ctx.presenter
            .present_unit(key, false, ctx.config.depths.popup);
        self.restack_popups(ctx);

        ctx.outbox.publish(NavigationEvent::PopupHidden(key.to_string()));
        Ok(())
    }

    fn restack_popups(&self, ctx: &mut GameContext) {
        let base = ctx.config.depths.popup;
        for (i, key) in self.popups.iter().enumerate() {
            ctx.presenter.present_unit(key, true, base + i as i32);
        }
    }

    /// Stops every launched popup; none survives a primary change.
    fn close_all_popups(&mut self, ctx: &mut GameContext) {
        let visible = std::mem::take(&mut self.popups);
        self.popup_history.clear();

        for (key, unit) in self.units.iter_mut() {
            if unit.layer != Layer::Popup || unit.status == UnitStatus::Stopped {
                continue;
            }
            unit.scene.on_exit(ctx);
            unit.status = UnitStatus::Stopped;
            ctx.scheduler.cancel_scope(&TimerScope::Unit(key.clone()));
            ctx.presenter
                .present_unit(key, false, ctx.config.depths.popup);
        }

        for key in visible.into_iter().rev() {
            debug!("Popup {} closed by scene change", key);
            ctx.outbox.publish(NavigationEvent::PopupHidden(key));
        }
    }

    //--- Pause / Resume ---------------------------------------------------

    /// Stops routing input, updates and timers to a running unit.
    pub fn pause(&mut self, ctx: &mut GameContext, key: &str) -> GameResult<()> {
        let is_current = self.is_current(key);
        let generation = self.generation;
        let unit = self
            .units
            .get_mut(key)
            .ok_or_else(|| GameError::not_found("scene unit", key))?;

        let UnitStatus::Running { visible } = unit.status else {
            return Err(GameError::precondition(format!("{} is not running", key)));
        };
        unit.status = UnitStatus::Paused { visible };

        if is_current {
            ctx.scheduler.pause_where(|s| s.within_scene(generation));
        } else {
            let scope = TimerScope::Unit(key.to_string());
            ctx.scheduler.pause_where(|s| *s == scope);
        }
        debug!("Paused {}", key);
        Ok(())
    }

    pub fn resume(&mut self, ctx: &mut GameContext, key: &str) -> GameResult<()> {
        let is_current = self.is_current(key);
        let generation = self.generation;
        let unit = self
            .units
            .get_mut(key)
            .ok_or_else(|| GameError::not_found("scene unit", key))?;

        let UnitStatus::Paused { visible } = unit.status else {
            return Err(GameError::precondition(format!("{} is not paused", key)));
        };
        unit.status = UnitStatus::Running { visible };

        if is_current {
            ctx.scheduler.resume_where(|s| s.within_scene(generation));
        } else {
            let scope = TimerScope::Unit(key.to_string());
            ctx.scheduler.resume_where(|s| *s == scope);
        }
        debug!("Resumed {}", key);
        Ok(())
    }

    //--- Request Processing -----------------------------------------------

    /// Applies queued navigation requests in FIFO order. Requests raised
    /// while applying are processed in a following round.
    pub fn process_requests(&mut self, ctx: &mut GameContext) {
        for _ in 0..MAX_REQUEST_ROUNDS {
            let requests = ctx.navigation.take();
            if requests.is_empty() {
                return;
            }
            for request in requests {
                if let Err(e) = self.apply(ctx, &request) {
                    warn!("Navigation request {:?} failed: {}", request, e);
                }
            }
        }
        if !ctx.navigation.is_empty() {
            warn!(
                "{} navigation request(s) deferred to the next tick",
                ctx.navigation.len()
            );
        }
    }

    fn apply(&mut self, ctx: &mut GameContext, request: &NavigationRequest) -> GameResult<()> {
        match request {
            NavigationRequest::ChangeScene { target, reference } => self
                .change_scene(ctx, target, reference.as_deref())
                .map(|_| ()),
            NavigationRequest::Back => self.go_back(ctx).map(|_| ()),
            NavigationRequest::ShowPopup(key) => self.show_popup(ctx, key),
            NavigationRequest::HidePopup(key) => self.hide_popup(ctx, key),
            NavigationRequest::CompanionUi(key) => self.update_companion_ui(ctx, key.as_deref()),
            NavigationRequest::Pause(key) => self.pause(ctx, key),
            NavigationRequest::Resume(key) => self.resume(ctx, key),
        }
    }

    //--- Routing ----------------------------------------------------------

    /// Offers an input event to popups (top first), then the companion,
    /// then the primary scene. Returns whether a unit consumed it.
    ///
    /// An opaque popup stops the event from reaching lower layers; an
    /// outside press it does not consume closes it.
    pub fn route_input(&mut self, ctx: &mut GameContext, event: &InputEvent) -> bool {
        let popups: Vec<String> = self.popups.iter().rev().cloned().collect();
        for key in popups {
            let Some(unit) = self.units.get_mut(&key) else {
                continue;
            };
            if !unit.status.is_running() {
                continue;
            }
            if unit.scene.on_input(ctx, event) {
                return true;
            }
            if !unit.scene.is_transparent() {
                if let InputEvent::PointerOutside { .. } = event {
                    ctx.navigation.push(NavigationRequest::HidePopup(key));
                    return true;
                }
                return false;
            }
        }

        if let Some(key) = self.companion.clone() {
            if let Some(unit) = self.units.get_mut(&key) {
                if unit.status == (UnitStatus::Running { visible: true })
                    && unit.scene.on_input(ctx, event)
                {
                    return true;
                }
            }
        }

        let Some(record) = &self.current else {
            return false;
        };
        match self.units.get_mut(&record.scene_key) {
            Some(unit) if unit.status.is_running() => unit.scene.on_input(ctx, event),
            _ => false,
        }
    }

    /// Delivers a fired timer to the unit owning its scope. Timers of a
    /// scene entry that has since been left are dropped.
    pub fn route_timer(&mut self, ctx: &mut GameContext, timer: &FiredTimer) {
        let key = match &timer.scope {
            TimerScope::Scene(g) | TimerScope::Session { scene: g, .. } => {
                if *g != self.generation {
                    debug!("Dropping stale timer {:?}", timer);
                    return;
                }
                match &self.current {
                    Some(record) => record.scene_key.clone(),
                    None => return,
                }
            }
            TimerScope::Unit(key) => key.clone(),
            TimerScope::Global => {
                debug!("Global timer fired: {:?}", timer.event);
                return;
            }
        };

        match self.units.get_mut(&key) {
            Some(unit) if unit.status.is_running() => unit.scene.on_timer(ctx, timer),
            _ => debug!("Timer {:?} for inactive unit {}", timer.event, key),
        }
    }

    /// Updates every running, visible unit: primary, companion, popups.
    pub fn update(&mut self, ctx: &mut GameContext) {
        let mut order: Vec<String> = Vec::new();
        order.extend(self.current.as_ref().map(|r| r.scene_key.clone()));
        order.extend(self.companion.clone());
        order.extend(self.popups.iter().cloned());

        for key in order {
            if let Some(unit) = self.units.get_mut(&key) {
                if unit.status == (UnitStatus::Running { visible: true }) {
                    unit.scene.update(ctx);
                }
            }
        }
    }

    /// Asks every started unit to re-resolve its displayed text.
    pub fn refresh(&mut self, ctx: &mut GameContext) {
        for unit in self.units.values_mut() {
            if unit.status != UnitStatus::Stopped {
                unit.scene.on_refresh(ctx);
            }
        }
    }

    //--- Helpers ----------------------------------------------------------

    fn is_current(&self, key: &str) -> bool {
        self.current.as_ref().is_some_and(|r| r.scene_key == key)
    }

    fn require_layer(&self, key: &str, layer: Layer) -> GameResult<()> {
        match self.units.get(key) {
            Some(unit) if unit.layer == layer => Ok(()),
            Some(unit) => Err(GameError::configuration(format!(
                "{} is a {:?} unit, not {:?}",
                key, unit.layer, layer
            ))),
            None => Err(GameError::not_found("scene unit", key)),
        }
    }

    /// Starts a stopped unit or makes a hidden one visible.
    fn show_unit(&mut self, ctx: &mut GameContext, key: &str, depth: i32) -> GameResult<()> {
        let unit = self
            .units
            .get_mut(key)
            .ok_or_else(|| GameError::not_found("scene unit", key))?;

        match unit.status {
            UnitStatus::Stopped => {
                let entry = SceneEntry {
                    key: key.to_string(),
                    reference: None,
                    scope: TimerScope::Unit(key.to_string()),
                    depth,
                };
                unit.status = UnitStatus::Running { visible: true };
                if let Err(e) = unit.scene.on_enter(ctx, &entry) {
                    unit.scene.on_exit(ctx);
                    unit.status = UnitStatus::Stopped;
                    ctx.scheduler.cancel_scope(&entry.scope);
                    return Err(e);
                }
            }
            UnitStatus::Running { visible: false } => {
                unit.status = UnitStatus::Running { visible: true };
                unit.scene.on_visibility(ctx, true);
            }
            UnitStatus::Paused { visible: false } => {
                unit.status = UnitStatus::Paused { visible: true };
                unit.scene.on_visibility(ctx, true);
            }
            UnitStatus::Running { visible: true } | UnitStatus::Paused { visible: true } => {}
        }

        ctx.presenter.present_unit(key, true, depth);
        Ok(())
    }
}

fn companion_of(ctx: &GameContext, scene_key: &str) -> Option<String> {
    ctx.data
        .scene(scene_key)
        .and_then(|meta| meta.companion_ui.clone())
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::InputEvent;
    use crate::core::scheduler::TimerEvent;
    use crate::presentation::{Point, RecordingPresenter, VisualHandle};
    use crate::testing::{self, Probe};

    /// Director with probe units for every fixture scene key.
    fn director(probe: &Probe) -> SceneDirector {
        let mut director = SceneDirector::new();
        for key in ["Village", "RiverBiome", "Activity", "VocabGame"] {
            director.register(key, UnitDescriptor::primary(probe.unit(key)));
        }
        director.register("NavBar", UnitDescriptor::companion(probe.unit("NavBar")));
        director.register("Inventory", UnitDescriptor::popup(probe.unit("Inventory")));
        director.register("Settings", UnitDescriptor::popup(probe.unit("Settings")));
        director
    }

    fn started() -> (SceneDirector, GameContext, Probe, RecordingPresenter) {
        let probe = Probe::new();
        let mut director = director(&probe);
        let (mut ctx, presenter) = testing::context_with_presenter();
        director.start(&mut ctx, "Village", None).unwrap();
        ctx.outbox.clear_all();
        probe.clear();
        (director, ctx, probe, presenter)
    }

    #[test]
    fn start_does_not_record_history() {
        let (director, _ctx, _probe, _presenter) = started();
        assert_eq!(director.current().unwrap().scene_key, "Village");
        assert!(director.history().is_empty());
        assert_eq!(director.companion(), Some("NavBar"));
    }

    #[test]
    fn reregistering_is_a_noop() {
        let probe = Probe::new();
        let mut director = director(&probe);
        assert!(!director.register("Village", UnitDescriptor::primary(probe.unit("Other"))));
        assert!(director.is_registered("Village"));
    }

    #[test]
    fn change_scene_pushes_history_and_orders_teardown() {
        let (mut director, mut ctx, probe, _presenter) = started();
        director.show_popup(&mut ctx, "Inventory").unwrap();
        probe.clear();

        assert!(director.change_scene(&mut ctx, "Activity", Some("weaving")).unwrap());

        assert_eq!(
            probe.log(),
            vec![
                "Inventory:exit",
                "NavBar:hidden",
                "Village:exit",
                "Activity:enter(weaving)",
            ]
        );
        assert_eq!(
            director.history(),
            &[SceneRecord {
                scene_key: "Village".into(),
                reference: None
            }]
        );
        assert_eq!(director.companion(), None);
    }

    #[test]
    fn change_to_same_scene_is_idempotent() {
        let (mut director, mut ctx, probe, _presenter) = started();
        director.change_scene(&mut ctx, "Activity", Some("weaving")).unwrap();
        director.show_popup(&mut ctx, "Settings").unwrap();
        probe.clear();

        assert!(!director.change_scene(&mut ctx, "Activity", Some("weaving")).unwrap());
        assert_eq!(director.history().len(), 1);
        assert!(probe.log().is_empty());
        assert_eq!(director.active_popups(), &["Settings".to_string()]);
    }

    #[test]
    fn unknown_scene_leaves_state_untouched() {
        let (mut director, mut ctx, probe, _presenter) = started();
        let err = director.change_scene(&mut ctx, "Moon", None).unwrap_err();
        assert!(matches!(err, GameError::SceneNotFound { .. }));
        assert_eq!(director.current().unwrap().scene_key, "Village");
        assert!(director.history().is_empty());
        assert!(probe.log().is_empty());
    }

    #[test]
    fn reference_name_resolves_and_sets_biome() {
        let (mut director, mut ctx, _probe, _presenter) = started();
        director.change_scene(&mut ctx, "river", None).unwrap();
        assert_eq!(director.current().unwrap().scene_key, "RiverBiome");
        assert_eq!(director.current_biome(), Some("river"));
        assert!(ctx
            .outbox
            .read::<NavigationEvent>()
            .contains(&NavigationEvent::BiomeChanged("river".into())));
    }

    #[test]
    fn go_back_on_empty_history_is_noop() {
        let (mut director, mut ctx, probe, _presenter) = started();
        assert!(!director.go_back(&mut ctx).unwrap());
        assert_eq!(director.current().unwrap().scene_key, "Village");
        assert!(probe.log().is_empty());
        assert_eq!(ctx.outbox.read::<NavigationEvent>(), &[NavigationEvent::BackIgnored]);
    }

    #[test]
    fn history_length_tracks_changes_minus_backs() {
        let (mut director, mut ctx, _probe, _presenter) = started();
        director.change_scene(&mut ctx, "RiverBiome", None).unwrap();
        director.change_scene(&mut ctx, "Activity", Some("weaving")).unwrap();
        assert_eq!(director.history().len(), 2);

        director.go_back(&mut ctx).unwrap();
        assert_eq!(director.current().unwrap().scene_key, "RiverBiome");
        assert_eq!(director.history().len(), 1);

        director.change_scene(&mut ctx, "VocabGame", Some("animals")).unwrap();
        assert_eq!(director.history().len(), 2);

        director.go_back(&mut ctx).unwrap();
        director.go_back(&mut ctx).unwrap();
        assert_eq!(director.current().unwrap().scene_key, "Village");
        assert!(director.history().is_empty());
        assert!(!director.go_back(&mut ctx).unwrap());
    }

    #[test]
    fn go_back_restores_companion() {
        let (mut director, mut ctx, _probe, _presenter) = started();
        director.change_scene(&mut ctx, "Activity", Some("weaving")).unwrap();
        assert_eq!(director.companion(), None);
        director.go_back(&mut ctx).unwrap();
        assert_eq!(director.companion(), Some("NavBar"));
        assert_eq!(director.status("NavBar"), Some(UnitStatus::Running { visible: true }));
    }

    #[test]
    fn scene_change_closes_all_popups() {
        let (mut director, mut ctx, _probe, _presenter) = started();
        director.show_popup(&mut ctx, "Inventory").unwrap();
        director.show_popup(&mut ctx, "Settings").unwrap();
        assert_eq!(director.active_popups().len(), 2);

        director.change_scene(&mut ctx, "RiverBiome", None).unwrap();
        assert!(director.active_popups().is_empty());
        assert!(director.popup_history().is_empty());
        assert_eq!(director.status("Inventory"), Some(UnitStatus::Stopped));
        assert_eq!(director.status("Settings"), Some(UnitStatus::Stopped));
    }

    #[test]
    fn popups_stack_above_companion() {
        let (mut director, mut ctx, _probe, presenter) = started();
        director.show_popup(&mut ctx, "Inventory").unwrap();
        director.show_popup(&mut ctx, "Settings").unwrap();

        assert_eq!(presenter.unit_state("Village"), Some((true, 0)));
        assert_eq!(presenter.unit_state("NavBar"), Some((true, 100)));
        assert_eq!(presenter.unit_state("Inventory"), Some((true, 119)));
        assert_eq!(presenter.unit_state("Settings"), Some((true, 120)));

        director.hide_popup(&mut ctx, "Inventory").unwrap();
        assert_eq!(presenter.unit_state("Settings"), Some((true, 119)));
        assert_eq!(director.popup_history(), &["Settings".to_string()]);
    }

    #[test]
    fn hidden_popup_keeps_state_and_reshows() {
        let (mut director, mut ctx, probe, _presenter) = started();
        director.show_popup(&mut ctx, "Inventory").unwrap();
        director.hide_popup(&mut ctx, "Inventory").unwrap();
        director.show_popup(&mut ctx, "Inventory").unwrap();

        assert_eq!(
            probe.log(),
            vec!["Inventory:enter", "Inventory:hidden", "Inventory:shown"]
        );
    }

    #[test]
    fn companion_update_is_idempotent() {
        let (mut director, mut ctx, probe, _presenter) = started();
        director.update_companion_ui(&mut ctx, Some("NavBar")).unwrap();
        director.update_companion_ui(&mut ctx, Some("NavBar")).unwrap();
        assert!(probe.log().is_empty());

        director.update_companion_ui(&mut ctx, None).unwrap();
        assert_eq!(director.companion(), None);
        assert_eq!(probe.log(), vec!["NavBar:hidden"]);
    }

    #[test]
    fn wrong_layer_is_rejected() {
        let (mut director, mut ctx, _probe, _presenter) = started();
        assert!(director.show_popup(&mut ctx, "NavBar").is_err());
        assert!(director.update_companion_ui(&mut ctx, Some("Inventory")).is_err());
    }

    #[test]
    fn failed_entry_returns_to_caller_scene() {
        let (mut director, mut ctx, probe, _presenter) = started();
        probe.fail_enter("Activity");

        assert!(director.change_scene(&mut ctx, "Activity", Some("weaving")).is_err());
        assert_eq!(director.current().unwrap().scene_key, "Village");
        assert!(director.history().is_empty());
        assert_eq!(director.status("Activity"), Some(UnitStatus::Stopped));
    }

    #[test]
    fn timers_of_left_scene_never_fire() {
        let (mut director, mut ctx, probe, _presenter) = started();
        let old_scope = TimerScope::Scene(director.generation());
        ctx.scheduler.schedule(old_scope.clone(), 100, TimerEvent::DialogueStart);

        director.change_scene(&mut ctx, "RiverBiome", None).unwrap();
        assert_eq!(ctx.scheduler.pending_in(&old_scope), 0);

        // A stale scope delivered by hand is dropped as well.
        let stale = FiredTimer {
            id: crate::core::scheduler::TimerId(99),
            scope: old_scope,
            event: TimerEvent::DialogueStart,
        };
        probe.clear();
        director.route_timer(&mut ctx, &stale);
        assert!(probe.log().is_empty());
    }

    #[test]
    fn requests_apply_in_fifo_order() {
        let (mut director, mut ctx, _probe, _presenter) = started();
        ctx.navigation.push(NavigationRequest::ShowPopup("Inventory".into()));
        ctx.navigation.push(NavigationRequest::change("RiverBiome", None));
        ctx.navigation.push(NavigationRequest::ShowPopup("Settings".into()));

        director.process_requests(&mut ctx);
        assert_eq!(director.current().unwrap().scene_key, "RiverBiome");
        assert_eq!(director.active_popups(), &["Settings".to_string()]);
        assert!(ctx.navigation.is_empty());
    }

    #[test]
    fn modal_popup_blocks_input_and_closes_on_outside_press() {
        let (mut director, mut ctx, probe, _presenter) = started();
        director.show_popup(&mut ctx, "Inventory").unwrap();
        probe.clear();

        let tap = InputEvent::tap(VisualHandle(1));
        assert!(!director.route_input(&mut ctx, &tap));
        assert_eq!(probe.log(), vec!["Inventory:input"]);

        let outside = InputEvent::PointerOutside {
            position: Point::new(0.9, 0.9),
        };
        assert!(director.route_input(&mut ctx, &outside));
        director.process_requests(&mut ctx);
        assert!(director.active_popups().is_empty());
    }

    #[test]
    fn input_falls_through_companion_to_primary() {
        let (mut director, mut ctx, probe, _presenter) = started();
        director.route_input(&mut ctx, &InputEvent::tap(VisualHandle(1)));
        assert_eq!(probe.log(), vec!["NavBar:input", "Village:input"]);
    }

    #[test]
    fn paused_primary_gets_no_timers_until_resumed() {
        let (mut director, mut ctx, probe, _presenter) = started();
        let scope = TimerScope::Scene(director.generation());
        ctx.scheduler.schedule(scope, 100, TimerEvent::DialogueStart);

        director.pause(&mut ctx, "Village").unwrap();
        for fired in ctx.scheduler.advance(500) {
            director.route_timer(&mut ctx, &fired);
        }
        assert!(probe.log().is_empty());
        assert!(director.pause(&mut ctx, "Village").is_err());

        director.resume(&mut ctx, "Village").unwrap();
        for fired in ctx.scheduler.advance(100) {
            director.route_timer(&mut ctx, &fired);
        }
        assert_eq!(probe.log(), vec!["Village:timer"]);
    }
}
