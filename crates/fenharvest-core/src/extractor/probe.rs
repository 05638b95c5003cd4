//! Probe strategy: payloads read from live page state.

use serde_json::Value;
use tracing::{debug, trace};

use super::{Candidate, is_payload_shaped, payload_prefix};
use crate::error::PageError;
use crate::page::LivePage;

/// Walks component trees registered with the devtools hook, top down.
const FIBER_ROOTS_SCRIPT: &str = r#"(() => {
  const hook = window.__REACT_DEVTOOLS_GLOBAL_HOOK__;
  if (!hook || !hook.renderers || !hook.getFiberRoots) return null;
  const pick = (o) => {
    if (!o || typeof o !== 'object') return null;
    if (typeof o.fen === 'string') return o.fen;
    if (o.position && typeof o.position.fen === 'string') return o.position.fen;
    return null;
  };
  const seen = new Set();
  const walk = (fiber, depth) => {
    if (!fiber || depth > 30 || seen.has(fiber)) return null;
    seen.add(fiber);
    const found = pick(fiber.memoizedProps) || pick(fiber.memoizedState);
    if (found) return found;
    return walk(fiber.child, depth + 1) || walk(fiber.sibling, depth + 1);
  };
  for (const id of hook.renderers.keys()) {
    for (const root of hook.getFiberRoots(id)) {
      const found = walk(root.current, 0);
      if (found) return found;
    }
  }
  return null;
})()"#;

/// Climbs from the rendered board element through its component ancestors.
const FIBER_ANCESTORS_SCRIPT: &str = r#"(() => {
  const pick = (o) => {
    if (!o || typeof o !== 'object') return null;
    if (typeof o.fen === 'string') return o.fen;
    if (o.position && typeof o.position.fen === 'string') return o.position.fen;
    return null;
  };
  for (const el of document.querySelectorAll('svg, [class*="board" i]')) {
    const key = Object.keys(el).find(k => k.startsWith('__reactFiber$'));
    let fiber = key ? el[key] : null;
    for (let depth = 0; fiber && depth <= 30; depth++) {
      const found = pick(fiber.memoizedProps) || pick(fiber.memoizedState);
      if (found) return found;
      fiber = fiber.return;
    }
  }
  return null;
})()"#;

/// Scans top-level globals for an object carrying a position.
const GLOBALS_SCRIPT: &str = r#"(() => {
  const shape = /^[rnbqkpRNBQKP1-8\/]+\s+[wb]\s+/;
  for (const key of Object.keys(window)) {
    try {
      const value = window[key];
      if (value && typeof value === 'object' && typeof value.fen === 'string' && shape.test(value.fen)) {
        return value.fen;
      }
    } catch (e) {}
  }
  return null;
})()"#;

/// One page-state lookup, evaluated in the page.
#[derive(Debug, Clone)]
pub struct ProbeHeuristic {
    pub name: &'static str,
    pub script: &'static str,
}

/// Ordered page-state heuristics; the first payload-shaped result wins.
pub struct ProbeStrategy {
    heuristics: Vec<ProbeHeuristic>,
}

impl Default for ProbeStrategy {
    fn default() -> Self {
        Self::new(vec![
            ProbeHeuristic {
                name: "fiber-roots",
                script: FIBER_ROOTS_SCRIPT,
            },
            ProbeHeuristic {
                name: "fiber-ancestors",
                script: FIBER_ANCESTORS_SCRIPT,
            },
            ProbeHeuristic {
                name: "globals",
                script: GLOBALS_SCRIPT,
            },
        ])
    }
}

impl ProbeStrategy {
    pub fn new(heuristics: Vec<ProbeHeuristic>) -> Self {
        Self { heuristics }
    }

    /// Evaluate heuristics in order.
    ///
    /// Non-fatal faults count as "nothing found" for that heuristic; a lost
    /// session is returned so the caller can stop.
    pub async fn probe(&self, page: &dyn LivePage) -> Result<Option<Candidate>, PageError> {
        for heuristic in &self.heuristics {
            match page.evaluate(heuristic.script).await {
                Ok(Value::String(found)) => {
                    let found = found.trim();
                    if is_payload_shaped(found) {
                        debug!(
                            heuristic = heuristic.name,
                            payload = payload_prefix(found, 60),
                            "Probe found payload"
                        );
                        return Ok(Some(Candidate::probe(found)));
                    }
                    trace!(heuristic = heuristic.name, "Probe result is not payload-shaped");
                }
                Ok(_) => trace!(heuristic = heuristic.name, "Probe found nothing"),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => debug!(heuristic = heuristic.name, "Probe fault: {}", e),
            }
        }
        Ok(None)
    }
}
