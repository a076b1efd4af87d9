//=========================================================================
// Function Registry
//=========================================================================
//
// Named operations that content may invoke (dialogue lines, activity
// steps). Each name maps to a typed handler with a declared arity and an
// optional argument check, so every call in the content can be validated
// when the content loads rather than when the line or step runs.
//
// Content form (JSON):
//   { "function": "giveResource", "args": ["cedar", "2"], "sequence": "after" }
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

//=== Internal Dependencies ===============================================

use crate::core::error::{GameError, GameResult};
use crate::core::globals::GameContext;
use crate::core::scene::NavigationRequest;
use crate::data::ResourceMap;
use crate::events::UserNotification;

//=== FunctionCall ========================================================

/// When a step's call runs relative to the player's interaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallSequence {
    Before,
    #[default]
    After,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub function: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub sequence: CallSequence,
}

impl FunctionCall {
    pub fn new(function: &str, args: &[&str]) -> Self {
        Self {
            function: function.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            sequence: CallSequence::After,
        }
    }

    pub fn before(mut self) -> Self {
        self.sequence = CallSequence::Before;
        self
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.function, self.args.join(", "))
    }
}

//=== FunctionOutcome =====================================================

/// Result of a successful call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionOutcome {
    Done,
    /// The caller must not continue before this many milliseconds pass.
    Wait(u64),
}

//=== Handler =============================================================

type Run = dyn Fn(&mut GameContext, &[String]) -> GameResult<FunctionOutcome>;
type Check = fn(&[String]) -> Result<(), String>;

/// Accepted argument counts, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: usize,
}

impl Arity {
    pub const fn exactly(n: usize) -> Self {
        Self { min: n, max: n }
    }

    pub const fn between(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    fn accepts(&self, n: usize) -> bool {
        n >= self.min && n <= self.max
    }
}

struct Handler {
    arity: Arity,
    check: Option<Check>,
    run: Rc<Run>,
}

//=== FunctionRegistry ====================================================

/// Name → handler table shared by dialogue and activity sessions.
pub struct FunctionRegistry {
    handlers: BTreeMap<String, Handler>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl FunctionRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// A registry holding every built-in operation.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        builtins::install(&mut registry);
        registry
    }

    //--- Registration -----------------------------------------------------

    /// Registers a handler. A later registration under the same name
    /// replaces the earlier one.
    pub fn register<F>(&mut self, name: &str, arity: Arity, run: F)
    where
        F: Fn(&mut GameContext, &[String]) -> GameResult<FunctionOutcome> + 'static,
    {
        self.insert(name, arity, None, run);
    }

    /// Registers a handler whose arguments are also checked at load time.
    pub fn register_checked<F>(&mut self, name: &str, arity: Arity, check: Check, run: F)
    where
        F: Fn(&mut GameContext, &[String]) -> GameResult<FunctionOutcome> + 'static,
    {
        self.insert(name, arity, Some(check), run);
    }

    fn insert<F>(&mut self, name: &str, arity: Arity, check: Option<Check>, run: F)
    where
        F: Fn(&mut GameContext, &[String]) -> GameResult<FunctionOutcome> + 'static,
    {
        let handler = Handler {
            arity,
            check,
            run: Rc::new(run),
        };
        if self.handlers.insert(name.to_string(), handler).is_some() {
            warn!("Function {} was already registered and has been replaced", name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    //--- Validation -------------------------------------------------------

    /// Checks that the call names a known function with acceptable args.
    pub fn validate(&self, call: &FunctionCall) -> Result<(), String> {
        let handler = self
            .handlers
            .get(&call.function)
            .ok_or_else(|| format!("unknown function {}", call.function))?;

        if !handler.arity.accepts(call.args.len()) {
            return Err(format!(
                "{} takes {}..={} arguments, got {}",
                call.function,
                handler.arity.min,
                handler.arity.max,
                call.args.len()
            ));
        }
        match handler.check {
            Some(check) => check(&call.args).map_err(|e| format!("{}: {}", call, e)),
            None => Ok(()),
        }
    }

    //--- Invocation -------------------------------------------------------

    /// Runs a call against the game context.
    pub fn invoke(&self, ctx: &mut GameContext, call: &FunctionCall) -> GameResult<FunctionOutcome> {
        self.validate(call).map_err(GameError::Configuration)?;
        let run = match self.handlers.get(&call.function) {
            Some(handler) => Rc::clone(&handler.run),
            None => return Err(GameError::not_found("function", &call.function)),
        };

        debug!("Invoking {}", call);
        run(ctx, &call.args)
    }
}

//=== Argument Helpers ====================================================

fn parse_quantity(args: &[String], index: usize) -> Result<u32, String> {
    match args.get(index) {
        None => Ok(1),
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| format!("'{}' is not a quantity", raw)),
    }
}

fn check_quantity(args: &[String]) -> Result<(), String> {
    parse_quantity(args, 1).map(|_| ())
}

fn check_millis(args: &[String]) -> Result<(), String> {
    args[0]
        .parse::<u64>()
        .map(|_| ())
        .map_err(|_| format!("'{}' is not a duration in ms", args[0]))
}

fn single(resource: &str, qty: u32) -> ResourceMap {
    let mut map = ResourceMap::new();
    map.insert(resource.to_string(), qty);
    map
}

//=== Built-ins ===========================================================

mod builtins {
    use super::*;

    pub(super) fn install(registry: &mut FunctionRegistry) {
        registry.register_checked("giveResource", Arity::between(1, 2), check_quantity, |ctx, args| {
            let qty = parse_quantity(args, 1).map_err(GameError::Configuration)?;
            ctx.progress.add_resources("giveResource", &single(&args[0], qty))?;
            Ok(FunctionOutcome::Done)
        });

        registry.register_checked("takeResource", Arity::between(1, 2), check_quantity, |ctx, args| {
            let qty = parse_quantity(args, 1).map_err(GameError::Configuration)?;
            ctx.progress.deduct_resources("takeResource", &single(&args[0], qty))?;
            Ok(FunctionOutcome::Done)
        });

        registry.register("unlockActivity", Arity::exactly(1), |ctx, args| {
            ctx.data.activity(&args[0])?;
            if ctx.progress.unlock_activity(&args[0]) {
                ctx.outbox.publish(crate::events::ActivitiesUnlocked(vec![args[0].clone()]));
            }
            Ok(FunctionOutcome::Done)
        });

        registry.register("unlockBiome", Arity::exactly(1), |ctx, args| {
            ctx.data.biome(&args[0])?;
            ctx.progress.unlock_biome(&args[0]);
            Ok(FunctionOutcome::Done)
        });

        registry.register("changeScene", Arity::between(1, 2), |ctx, args| {
            ctx.navigation.push(NavigationRequest::ChangeScene {
                target: args[0].clone(),
                reference: args.get(1).cloned(),
            });
            Ok(FunctionOutcome::Done)
        });

        registry.register("showPopup", Arity::exactly(1), |ctx, args| {
            ctx.navigation.push(NavigationRequest::ShowPopup(args[0].clone()));
            Ok(FunctionOutcome::Done)
        });

        registry.register("hidePopup", Arity::exactly(1), |ctx, args| {
            ctx.navigation.push(NavigationRequest::HidePopup(args[0].clone()));
            Ok(FunctionOutcome::Done)
        });

        registry.register_checked("wait", Arity::exactly(1), check_millis, |_, args| {
            let ms = args[0]
                .parse::<u64>()
                .map_err(|_| GameError::configuration(format!("wait: bad duration {}", args[0])))?;
            Ok(FunctionOutcome::Wait(ms))
        });

        registry.register("showFeedback", Arity::between(1, usize::MAX), |ctx, args| {
            ctx.outbox.publish(UserNotification::feedback(args.join(" ")));
            Ok(FunctionOutcome::Done)
        });
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
