//! Record of what one reconsideration pass did.

use core::fmt;

use crate::direction::{Direction, PerDirection};

/// The five routing phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Phase {
    /// Mute routes that close or reflow.
    Mute,
    /// Disable routes that close or repath.
    Disable,
    /// Swap streams and apply the new configuration.
    Configure,
    /// Enable routes that open or repath.
    Enable,
    /// Unmute everything.
    Unmute,
}

impl Phase {
    /// All phases in execution order.
    pub const ALL: [Phase; 5] = [
        Phase::Mute,
        Phase::Disable,
        Phase::Configure,
        Phase::Enable,
        Phase::Unmute,
    ];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Mute => "mute",
            Phase::Disable => "disable",
            Phase::Configure => "configure",
            Phase::Enable => "enable",
            Phase::Unmute => "unmute",
        };
        f.write_str(s)
    }
}

/// One step of a pass, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "action", rename_all = "snake_case"))]
pub enum RoutingAction {
    /// A phase started.
    EnterPhase {
        /// Phase entered.
        phase: Phase,
    },
    /// Stream route disable transition.
    Unroute {
        /// Route key.
        route: String,
        /// Second (post-apply) call.
        post_disable: bool,
    },
    /// Stream route stream swap.
    Configure {
        /// Route key.
        route: String,
    },
    /// Stream route enable transition.
    Route {
        /// Route key.
        route: String,
        /// First (pre-apply) call.
        pre_enable: bool,
    },
    /// Every criterion pushed to the backend.
    Commit,
    /// Backend asked to apply configurations.
    Apply,
}

/// Per-direction route masks computed by a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteMasks {
    /// Routes used in this pass.
    pub enabled: u32,
    /// Routes used in the previous pass.
    pub prev_enabled: u32,
    /// Routes to mute and unmute.
    pub need_reflow: u32,
    /// Routes to disable and enable.
    pub need_repath: u32,
}

impl RouteMasks {
    /// Whether routing differs from the previous pass.
    pub fn has_changed(&self) -> bool {
        self.prev_enabled != self.enabled || self.need_reflow != 0 || self.need_repath != 0
    }

    /// Closing criterion value of the mute phase.
    pub fn routes_to_mute(&self) -> u32 {
        (self.prev_enabled & !self.enabled) | self.need_reflow
    }

    /// Opened criterion value of the mute phase.
    pub fn unmuted_routes(&self) -> u32 {
        self.prev_enabled & self.enabled & !self.need_reflow
    }

    /// Closing criterion value of the disable phase.
    pub fn routes_to_disable(&self) -> u32 {
        (self.prev_enabled & !self.enabled) | self.need_repath
    }

    /// Opened criterion value of the disable phase.
    pub fn opened_routes(&self) -> u32 {
        self.prev_enabled & self.enabled & !self.need_repath
    }
}

/// A failed stream route transition; the pass carried on.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteFailure {
    /// Phase of the failure.
    pub phase: Phase,
    /// Route key.
    pub route: String,
    /// Error message.
    pub error: String,
}

/// Outcome of one reconsideration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoutingReport {
    /// Whether the five phases ran.
    pub changed: bool,
    /// Route masks of the pass.
    pub masks: PerDirection<RouteMasks>,
    /// Ordered actions.
    pub actions: Vec<RoutingAction>,
    /// Transition failures.
    pub failures: Vec<RouteFailure>,
}

impl RoutingReport {
    /// Phases entered, in order.
    pub fn phases(&self) -> Vec<Phase> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                RoutingAction::EnterPhase { phase } => Some(*phase),
                _ => None,
            })
            .collect()
    }

    /// Number of backend applies.
    pub fn apply_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, RoutingAction::Apply))
            .count()
    }

    /// Number of criteria commits.
    pub fn commit_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, RoutingAction::Commit))
            .count()
    }

    /// Actions touching route `key`.
    pub fn route_actions<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a RoutingAction> {
        self.actions.iter().filter(move |a| match a {
            RoutingAction::Unroute { route, .. }
            | RoutingAction::Configure { route }
            | RoutingAction::Route { route, .. } => route == key,
            _ => false,
        })
    }

    /// Masks of one direction.
    pub fn masks(&self, direction: Direction) -> &RouteMasks {
        &self.masks[direction]
    }

    pub(crate) fn push(&mut self, action: RoutingAction) {
        self.actions.push(action);
    }
}

impl fmt::Display for RoutingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.changed {
            return writeln!(f, "routing unchanged, criteria committed");
        }
        for (dir, m) in self.masks.iter() {
            writeln!(
                f,
                "{dir}: prev={:#x} enabled={:#x} reflow={:#x} repath={:#x}",
                m.prev_enabled, m.enabled, m.need_reflow, m.need_repath
            )?;
        }
        for action in &self.actions {
            match action {
                RoutingAction::EnterPhase { phase } => writeln!(f, "  [{phase}]")?,
                RoutingAction::Unroute {
                    route,
                    post_disable,
                } => writeln!(f, "    unroute {route} post_disable={post_disable}")?,
                RoutingAction::Configure { route } => writeln!(f, "    configure {route}")?,
                RoutingAction::Route { route, pre_enable } => {
                    writeln!(f, "    route {route} pre_enable={pre_enable}")?;
                }
                RoutingAction::Commit => writeln!(f, "    commit criteria")?,
                RoutingAction::Apply => writeln!(f, "    apply")?,
            }
        }
        for failure in &self.failures {
            writeln!(
                f,
                "  failed in {}: {}: {}",
                failure.phase, failure.route, failure.error
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_masks() {
        let m = RouteMasks {
            prev_enabled: 0b0111,
            enabled: 0b1101,
            need_reflow: 0b0001,
            need_repath: 0b1000,
        };
        assert!(m.has_changed());
        assert_eq!(m.routes_to_mute(), 0b0011);
        assert_eq!(m.unmuted_routes(), 0b0100);
        assert_eq!(m.routes_to_disable(), 0b1010);
        assert_eq!(m.opened_routes(), 0b0101);
    }

    #[test]
    fn unchanged_masks() {
        let m = RouteMasks {
            prev_enabled: 3,
            enabled: 3,
            ..Default::default()
        };
        assert!(!m.has_changed());
    }
}
