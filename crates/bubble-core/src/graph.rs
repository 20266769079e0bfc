//! Multi-degree closure over the first-degree connection graph.
//!
//! The closure is computed by a breadth-first expansion capped at depth 3.
//! Each user is reported at the smallest depth it is reachable at, and the
//! origin never appears in its own closure.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The deepest degree reported by [`closure`].
pub const MAX_DEGREE: usize = 3;

/// Three disjoint sets of user ids, by degree of separation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connections {
  #[serde(rename = "firstConnections")]
  pub first:  BTreeSet<Uuid>,
  #[serde(rename = "secondConnections")]
  pub second: BTreeSet<Uuid>,
  #[serde(rename = "thirdConnections")]
  pub third:  BTreeSet<Uuid>,
}

impl Connections {
  /// The degree at which `id` is reachable, if within [`MAX_DEGREE`].
  pub fn degree_of(&self, id: Uuid) -> Option<usize> {
    [&self.first, &self.second, &self.third]
      .iter()
      .position(|set| set.contains(&id))
      .map(|i| i + 1)
  }

  fn level_mut(&mut self, depth: usize) -> &mut BTreeSet<Uuid> {
    match depth {
      1 => &mut self.first,
      2 => &mut self.second,
      _ => &mut self.third,
    }
  }
}

/// Compute the closure of `origin`.
///
/// `neighbours` returns the first-degree set of a user. It is called once for
/// the origin and once per user found at depth 1 or 2; lookup failures are
/// propagated unchanged.
pub fn closure<F, E>(origin: Uuid, mut neighbours: F) -> Result<Connections, E>
where
  F: FnMut(Uuid) -> Result<Vec<Uuid>, E>,
{
  let mut out = Connections::default();
  let mut seen = BTreeSet::from([origin]);
  let mut frontier = vec![origin];

  for depth in 1..=MAX_DEGREE {
    let mut next = Vec::new();
    for id in frontier {
      for peer in neighbours(id)? {
        if seen.insert(peer) {
          out.level_mut(depth).insert(peer);
          next.push(peer);
        }
      }
    }
    if next.is_empty() {
      break;
    }
    frontier = next;
  }

  Ok(out)
}
