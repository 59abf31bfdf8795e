//! Church economy: followers, tithes and faith influence.
//!
//! # Income
//!
//! income = floor(followers × tithe_rate × connected)
//!
//! # Growth
//!
//! Δfollowers = floor(secured_tiles × growth_constant × (1 − tithe_rate / max_tithe_rate))
//!
//! A church taxing at the maximum rate stops growing entirely, so a player
//! trades income now for followers later.
//!
//! # Influence
//!
//! Every owned church pushes faith into the disc around it each influence
//! phase. Unclaimed or friendly cells gain strength; cells held by another
//! player lose strength and only fall to neutral once it reaches zero.

// Follower counts are well inside f64's exact integer range.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{InfluenceConfig, TitheConfig};
use crate::game::{Grid, MAX_FAITH, PlayerId, Position, TerrainKind};

/// Unique identifier for a church.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChurchId(pub u32);

impl std::fmt::Display for ChurchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "church-{}", self.0)
    }
}

/// A church sitting on a Church terrain cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Church {
    /// Unique identifier.
    pub id: ChurchId,
    /// Cell the church stands on. Never changes.
    pub position: Position,
    /// Owning player, `None` until captured.
    pub owner: Option<PlayerId>,
    /// Congregation size.
    pub followers: u64,
    /// Fraction of followers collected as gold each economic phase.
    pub tithe_rate: f64,
    /// Whether the church is linked to its owner's capital.
    pub connected: bool,
    /// Radius of the faith disc this church projects.
    pub influence_radius: u32,
}

/// Owns every church. Iteration follows discovery order.
#[derive(Debug, Clone)]
pub struct ChurchRegistry {
    churches: Vec<Church>,
    tithe: TitheConfig,
    influence: InfluenceConfig,
}

impl ChurchRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new(tithe: TitheConfig, influence: InfluenceConfig) -> Self {
        Self {
            churches: Vec::new(),
            tithe,
            influence,
        }
    }

    /// Tithe settings in use.
    #[must_use]
    pub const fn tithe_config(&self) -> &TitheConfig {
        &self.tithe
    }

    /// Create a church for every Church cell not yet tracked.
    ///
    /// Returns the number of churches created.
    pub fn discover_from_grid(&mut self, grid: &Grid) -> usize {
        let mut created = 0;
        for pos in grid.cells_of(TerrainKind::Church) {
            if self.church_at(pos).is_some() {
                continue;
            }
            let id = ChurchId(u32::try_from(self.churches.len() + 1).unwrap_or(u32::MAX));
            self.churches.push(Church {
                id,
                position: pos,
                owner: None,
                followers: self.tithe.initial_followers,
                tithe_rate: self.tithe.default_rate,
                connected: false,
                influence_radius: self.influence.radius,
            });
            created += 1;
        }
        debug!(created, total = self.churches.len(), "discovered churches");
        created
    }

    /// Look up a church.
    #[must_use]
    pub fn get(&self, id: ChurchId) -> Option<&Church> {
        self.churches.iter().find(|church| church.id == id)
    }

    fn get_mut(&mut self, id: ChurchId) -> Option<&mut Church> {
        self.churches.iter_mut().find(|church| church.id == id)
    }

    /// Church standing on a cell.
    #[must_use]
    pub fn church_at(&self, pos: Position) -> Option<&Church> {
        self.churches.iter().find(|church| church.position == pos)
    }

    /// Iterate over all churches in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Church> {
        self.churches.iter()
    }

    /// Churches owned by a player.
    pub fn owned_by(&self, player: PlayerId) -> impl Iterator<Item = &Church> {
        self.churches
            .iter()
            .filter(move |church| church.owner == Some(player))
    }

    /// Hand a church to a player. The last capture wins.
    ///
    /// Returns `false` if the church does not exist.
    pub fn capture(&mut self, id: ChurchId, player: PlayerId) -> bool {
        let Some(church) = self.get_mut(id) else {
            return false;
        };
        church.owner = Some(player);
        debug!(%id, player, "church captured");
        true
    }

    /// Set a church's tithe rate, clamped into the configured band.
    ///
    /// Returns the rate actually applied, or `None` if the church does not exist.
    pub fn set_tithe_rate(&mut self, id: ChurchId, rate: f64) -> Option<f64> {
        let clamped = self.tithe.clamp_rate(rate);
        let church = self.get_mut(id)?;
        church.tithe_rate = clamped;
        Some(clamped)
    }

    /// Refresh every church's link to its owner's capital.
    pub fn update_connections(&mut self) {
        // TODO: route from each church to its owner's capital instead of
        // treating every church as linked.
        for church in &mut self.churches {
            church.connected = true;
        }
    }

    /// Gold a church yields this economic phase.
    #[must_use]
    pub fn income(church: &Church) -> u64 {
        if church.owner.is_none() {
            return 0;
        }
        let link = if church.connected { 1.0 } else { 0.0 };
        (church.followers as f64 * church.tithe_rate * link).floor() as u64
    }

    /// Total income across every church a player owns.
    #[must_use]
    pub fn collect_tithes(&self, player: PlayerId) -> u64 {
        let total = self.owned_by(player).map(Self::income).sum();
        debug!(player, total, "collected tithes");
        total
    }

    /// Follower growth for a church given its secured territory.
    #[must_use]
    pub fn follower_growth(&self, church: &Church, territory_bonus: u32) -> u64 {
        let penalty = if self.tithe.max_rate > 0.0 {
            church.tithe_rate / self.tithe.max_rate
        } else {
            1.0
        };
        let growth =
            (f64::from(territory_bonus) * self.tithe.growth_constant * (1.0 - penalty)).floor();
        if growth > 0.0 { growth as u64 } else { 0 }
    }

    /// Grow one church's followers. Followers have no upper bound.
    ///
    /// Returns the growth applied, or `None` if the church does not exist.
    pub fn grow_followers(&mut self, id: ChurchId, territory_bonus: u32) -> Option<u64> {
        let growth = self.follower_growth(self.get(id)?, territory_bonus);
        let church = self.get_mut(id)?;
        church.followers = church.followers.saturating_add(growth);
        Some(growth)
    }

    /// Push faith from every owned church into the surrounding disc.
    pub fn expand_influence(&self, grid: &mut Grid) {
        let InfluenceConfig {
            increment,
            decrement,
            ..
        } = self.influence;

        for church in &self.churches {
            let Some(owner) = church.owner else {
                continue;
            };
            for pos in grid.positions_in_radius(church.position, church.influence_radius) {
                let Some(tile) = grid.cell_at_mut(pos) else {
                    continue;
                };
                match tile.controller() {
                    None => tile.set_faith(Some(owner), increment.min(MAX_FAITH)),
                    Some(holder) if holder == owner => {
                        tile.set_faith(Some(owner), tile.faith().saturating_add(increment));
                    }
                    Some(holder) => {
                        tile.set_faith(Some(holder), tile.faith().saturating_sub(decrement));
                    }
                }
            }
        }
    }

    /// Number of cells around a church its owner holds above the secured threshold.
    #[must_use]
    pub fn secured_tiles(&self, church: &Church, grid: &Grid) -> u32 {
        let Some(owner) = church.owner else {
            return 0;
        };
        let count = grid
            .cells_in_radius(church.position, church.influence_radius)
            .into_iter()
            .filter(|tile| {
                tile.controller() == Some(owner) && tile.faith() > self.influence.secured_threshold
            })
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Grow every owned church by its secured territory.
    pub fn grow_all_followers(&mut self, grid: &Grid) {
        let bonuses: Vec<(ChurchId, u32)> = self
            .churches
            .iter()
            .filter(|church| church.owner.is_some())
            .map(|church| (church.id, self.secured_tiles(church, grid)))
            .collect();

        for (id, bonus) in bonuses {
            if let Some(growth) = self.grow_followers(id, bonus) {
                debug!(%id, bonus, growth, "followers grew");
            }
        }
    }
}
