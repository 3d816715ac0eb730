//! JSON scenario descriptions.
//!
//! A [`Scenario`] lists named entities and the behaviour attached to each.
//! Entities refer to one another by name; [`Scenario::build`] resolves the
//! names, validates every configuration and returns a ready [`Simulation`].
//!
//! ```json
//! {
//!   "seed": 7,
//!   "entities": [
//!     { "name": "hare", "position": [0, 0, 0], "limits": { "move_speed": 2, "max_move_speed": 2 } },
//!     { "name": "hound", "position": [-5, 0, 0] }
//!   ],
//!   "behaviours": [
//!     { "entity": "hound", "behaviour": { "type": "pursuit", "target": "hare" } }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use glam::Vec3;
use hashbrown::HashMap;
use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use crate::entity::{EntityGroup, EntityId, EntityKind, MovingEntity, MovingEntityConfig};
use crate::error::{ConfigError, ConfigResult};
use crate::simulation::Simulation;
use crate::spatial::{Aabb, BoundingVolume, RayCaster, Sphere};
use crate::steering::{
    Alignment, Arrive, ArriveConfig, BalancedCompound, BoxExplore, BoxExploreConfig, Cohesion,
    Compound, Containment, ContainmentConfig, Evade, Flee, Hide, HideConfig, LeaderFollowing,
    LeaderFollowingConfig, NeighbourhoodConfig, ObstacleAvoidance, ObstacleAvoidanceConfig,
    PathFollow, PathFollowConfig, Pursuit, PursuitConfig, Queuing, QueuingConfig, Seek,
    Separation, SphereExplore, SphereExploreConfig, SphereWander, SphereWanderConfig,
    SteeringBehaviour, Strength, StrengthHandle, Target, Throttled, UnalignedCollisionAvoidance,
    UnalignedCollisionAvoidanceConfig, WallApproach, WallApproachConfig, Wander, WanderConfig,
};
use crate::world::World;

/// Failure to load or assemble a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The scenario file could not be read.
    #[error("failed to read scenario {path:?}: {source}")]
    Io {
        /// File that failed to open.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The scenario was not valid JSON or did not match the schema.
    #[error("malformed scenario: {0}")]
    Parse(#[from] serde_json::Error),
    /// A reference named an entity the scenario does not declare.
    #[error("no entity named {name:?}")]
    UnknownName {
        /// The unresolved name.
        name: String,
    },
    /// Two entities were declared under the same name.
    #[error("entity name {name:?} is declared twice")]
    DuplicateName {
        /// The repeated name.
        name: String,
    },
    /// An entity or behaviour configuration was rejected.
    #[error("invalid configuration for {entity:?}: {source}")]
    Config {
        /// Name of the entity being configured.
        entity: String,
        /// Validation failure.
        #[source]
        source: ConfigError,
    },
}

/// A complete scenario: random seed, entities and their behaviours.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Seed for the simulation's random source.
    #[serde(default)]
    pub seed: u64,
    /// Entities to spawn, in order.
    #[serde(default)]
    pub entities: Vec<EntitySpec>,
    /// Behaviours to attach once every entity exists.
    #[serde(default)]
    pub behaviours: Vec<Attachment>,
}

/// One entity of a [`Scenario`].
#[derive(Debug, Clone, Deserialize)]
pub struct EntitySpec {
    /// Unique name other entries refer to.
    pub name: String,
    /// Capability tag.
    #[serde(default)]
    pub kind: EntityKind,
    /// Starting position.
    #[serde(default)]
    pub position: Vec3,
    /// Starting velocity.
    #[serde(default)]
    pub velocity: Vec3,
    /// Mass, speed and force limits.
    #[serde(default)]
    pub limits: MovingEntityConfig,
}

/// A behaviour bound to a named entity.
#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    /// Name of the steered entity.
    pub entity: String,
    /// What steers it.
    pub behaviour: BehaviourSpec,
}

/// Target given either as an entity name or a fixed point.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TargetSpec {
    /// Track the named entity.
    Entity(String),
    /// Steer toward a fixed point.
    Point(Vec3),
}

/// Closed volume used for containment and wall probing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum VolumeSpec {
    /// Axis-aligned box.
    Aabb {
        /// Minimum corner.
        min: Vec3,
        /// Maximum corner.
        max: Vec3,
    },
    /// Sphere.
    Sphere {
        /// Centre.
        center: Vec3,
        /// Radius.
        radius: f32,
    },
}

impl VolumeSpec {
    /// Build the volume for containment.
    ///
    /// # Errors
    /// Propagates the shape's own validation.
    pub fn volume(&self) -> ConfigResult<Rc<dyn BoundingVolume>> {
        let shape: Rc<dyn BoundingVolume> = match *self {
            Self::Aabb { min, max } => Rc::new(Aabb::new(min, max)?),
            Self::Sphere { center, radius } => Rc::new(Sphere::new(center, radius)?),
        };
        Ok(shape)
    }

    /// Build the volume as a ray oracle.
    ///
    /// # Errors
    /// Propagates the shape's own validation.
    pub fn caster(&self) -> ConfigResult<Rc<dyn RayCaster>> {
        let shape: Rc<dyn RayCaster> = match *self {
            Self::Aabb { min, max } => Rc::new(Aabb::new(min, max)?),
            Self::Sphere { center, radius } => Rc::new(Sphere::new(center, radius)?),
        };
        Ok(shape)
    }
}

/// Serialised form of every behaviour, tagged by `"type"`.
///
/// Entity references (`target`, `leader`, `threat`, groups) are names
/// declared in [`Scenario::entities`].
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BehaviourSpec {
    /// [`Seek`].
    Seek {
        /// What to seek; nothing means no force.
        #[serde(default)]
        target: Option<TargetSpec>,
    },
    /// [`Flee`].
    Flee {
        /// What to flee.
        #[serde(default)]
        target: Option<TargetSpec>,
    },
    /// [`Pursuit`].
    Pursuit {
        /// What to pursue.
        #[serde(default)]
        target: Option<TargetSpec>,
        /// Prediction tuning.
        #[serde(default)]
        config: PursuitConfig,
    },
    /// [`Evade`].
    Evade {
        /// What to evade.
        #[serde(default)]
        target: Option<TargetSpec>,
        /// Prediction tuning.
        #[serde(default)]
        config: PursuitConfig,
    },
    /// [`Arrive`].
    Arrive {
        /// Where to arrive.
        #[serde(default)]
        target: Option<TargetSpec>,
        /// Slow-down tuning.
        #[serde(default)]
        config: ArriveConfig,
    },
    /// [`Wander`] inside a box.
    Wander {
        /// Box holding the random destinations.
        area: Aabb,
        /// Retargeting interval.
        #[serde(default)]
        config: WanderConfig,
    },
    /// [`SphereWander`].
    SphereWander {
        /// Sphere geometry and jitter.
        #[serde(default)]
        config: SphereWanderConfig,
    },
    /// [`Separation`].
    Separation {
        /// Names to keep apart from.
        group: Vec<String>,
    },
    /// [`Cohesion`].
    Cohesion {
        /// Names to gather with.
        group: Vec<String>,
        /// Visibility filter.
        #[serde(default)]
        neighbourhood: NeighbourhoodConfig,
    },
    /// [`Alignment`].
    Alignment {
        /// Names to align with.
        group: Vec<String>,
        /// Visibility filter.
        #[serde(default)]
        neighbourhood: NeighbourhoodConfig,
    },
    /// [`ObstacleAvoidance`].
    ObstacleAvoidance {
        /// Names of the obstacles.
        obstacles: Vec<String>,
        /// Lookahead tuning.
        #[serde(default)]
        config: ObstacleAvoidanceConfig,
    },
    /// [`UnalignedCollisionAvoidance`].
    UnalignedCollisionAvoidance {
        /// Names of the other movers.
        others: Vec<String>,
        /// Lookahead tuning.
        #[serde(default)]
        config: UnalignedCollisionAvoidanceConfig,
    },
    /// [`PathFollow`].
    PathFollow {
        /// Ordered waypoints; at least two.
        points: Vec<Vec3>,
        /// Corridor tuning.
        #[serde(default)]
        config: PathFollowConfig,
    },
    /// [`Containment`].
    Containment {
        /// Volume to stay inside.
        volume: VolumeSpec,
        /// Lookahead tuning.
        #[serde(default)]
        config: ContainmentConfig,
    },
    /// [`LeaderFollowing`].
    LeaderFollowing {
        /// Name of the leader.
        leader: String,
        /// Trailing tuning.
        #[serde(default)]
        config: LeaderFollowingConfig,
    },
    /// [`Hide`].
    Hide {
        /// Name of the entity to hide from.
        threat: String,
        /// Names of candidate cover.
        obstacles: Vec<String>,
        /// Standoff tuning.
        #[serde(default)]
        config: HideConfig,
    },
    /// [`BoxExplore`].
    BoxExplore {
        /// Box and grid spacing.
        #[serde(default)]
        config: BoxExploreConfig,
    },
    /// [`SphereExplore`].
    SphereExplore {
        /// Sphere and grid spacing.
        #[serde(default)]
        config: SphereExploreConfig,
    },
    /// [`WallApproach`].
    WallApproach {
        /// Solid to approach.
        wall: VolumeSpec,
        /// Standoff tuning.
        #[serde(default)]
        config: WallApproachConfig,
    },
    /// Sum of the children's forces.
    Compound {
        /// Child behaviours, steering the same entity.
        children: Vec<BehaviourSpec>,
    },
    /// Magnitude-preserving weighted sum of the children's forces.
    BalancedCompound {
        /// Child behaviours, steering the same entity.
        children: Vec<BehaviourSpec>,
        /// Whether to rebalance; plain summing otherwise.
        #[serde(default = "enabled")]
        balancing: bool,
    },
    /// A behaviour scaled by a fixed strength.
    Throttled {
        /// Scale applied to the inner force.
        #[serde(default)]
        strength: Strength,
        /// Wrapped behaviour.
        inner: Box<BehaviourSpec>,
    },
    /// A behaviour braked by [`Queuing`] when neighbours crowd ahead.
    Queued {
        /// Names of the entities to queue behind.
        neighbours: Vec<String>,
        /// Braking tuning.
        #[serde(default)]
        config: QueuingConfig,
        /// Braked behaviour.
        inner: Box<BehaviourSpec>,
    },
}

const fn enabled() -> bool {
    true
}

impl Scenario {
    /// Parse a scenario from JSON text.
    ///
    /// # Errors
    /// Returns [`ScenarioError::Parse`] for malformed input.
    pub fn from_json(text: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a scenario file.
    ///
    /// # Errors
    /// Returns [`ScenarioError::Io`] or [`ScenarioError::Parse`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let file = path.as_ref();
        let text = fs::read_to_string(file).map_err(|source| ScenarioError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        debug!("loaded scenario from {}", file.display());
        Self::from_json(&text)
    }

    /// Spawn the entities, attach the behaviours and return the simulation.
    ///
    /// # Errors
    /// Fails on duplicate or unknown names and on any rejected
    /// configuration.
    pub fn build(&self) -> Result<Simulation, ScenarioError> {
        let mut world = World::new();
        let mut names: HashMap<String, EntityId> = HashMap::new();
        for spec in &self.entities {
            if names.contains_key(&spec.name) {
                return Err(ScenarioError::DuplicateName {
                    name: spec.name.clone(),
                });
            }
            let mut entity = MovingEntity::from_config(spec.kind, spec.position, &spec.limits)
                .map_err(|source| ScenarioError::Config {
                    entity: spec.name.clone(),
                    source,
                })?;
            entity.velocity = spec.velocity;
            names.insert(spec.name.clone(), world.spawn(entity));
        }

        let mut built = Vec::with_capacity(self.behaviours.len());
        for attachment in &self.behaviours {
            let assembler = Assembler {
                owner: &attachment.entity,
                id: lookup(&names, &attachment.entity)?,
                names: &names,
                world: &world,
            };
            built.push(assembler.build(&attachment.behaviour)?);
        }

        let mut simulation = Simulation::new(world, self.seed);
        for (name, id) in names {
            simulation.name(id, name);
        }
        for behaviour in built {
            simulation.attach(behaviour);
        }
        info!(
            "scenario ready: {} entities, {} behaviours, seed {}",
            self.entities.len(),
            simulation.active(),
            self.seed
        );
        Ok(simulation)
    }
}

fn lookup(names: &HashMap<String, EntityId>, name: &str) -> Result<EntityId, ScenarioError> {
    names
        .get(name)
        .copied()
        .ok_or_else(|| ScenarioError::UnknownName {
            name: name.to_owned(),
        })
}

fn boxed(behaviour: impl SteeringBehaviour + 'static) -> Box<dyn SteeringBehaviour> {
    Box::new(behaviour)
}

/// Turns [`BehaviourSpec`]s into behaviours bound to one entity.
struct Assembler<'a> {
    owner: &'a str,
    id: EntityId,
    names: &'a HashMap<String, EntityId>,
    world: &'a World,
}

impl Assembler<'_> {
    fn group(&self, members: &[String]) -> Result<EntityGroup, ScenarioError> {
        members
            .iter()
            .map(|name| lookup(self.names, name))
            .collect::<Result<Vec<_>, _>>()
            .map(EntityGroup::new)
    }

    fn target(&self, spec: Option<&TargetSpec>) -> Result<Option<Target>, ScenarioError> {
        spec.map(|target| match target {
            TargetSpec::Entity(name) => lookup(self.names, name).map(Target::Entity),
            TargetSpec::Point(point) => Ok(Target::Point(*point)),
        })
        .transpose()
    }

    fn checked<T>(&self, result: ConfigResult<T>) -> Result<T, ScenarioError> {
        result.map_err(|source| ScenarioError::Config {
            entity: self.owner.to_owned(),
            source,
        })
    }

    fn build(&self, spec: &BehaviourSpec) -> Result<Box<dyn SteeringBehaviour>, ScenarioError> {
        let id = self.id;
        match spec {
            BehaviourSpec::Seek { target } => self
                .target(target.as_ref())
                .map(|resolved| boxed(Seek::new(id, resolved))),
            BehaviourSpec::Flee { target } => self
                .target(target.as_ref())
                .map(|resolved| boxed(Flee::new(id, resolved))),
            BehaviourSpec::Pursuit { target, config } => self
                .target(target.as_ref())
                .and_then(|resolved| self.checked(Pursuit::new(id, resolved, config)))
                .map(boxed),
            BehaviourSpec::Evade { target, config } => self
                .target(target.as_ref())
                .and_then(|resolved| self.checked(Evade::new(id, resolved, config)))
                .map(boxed),
            BehaviourSpec::Arrive { target, config } => self
                .target(target.as_ref())
                .and_then(|resolved| self.checked(Arrive::new(id, resolved, config)))
                .map(boxed),
            BehaviourSpec::Wander { area, config } => {
                self.checked(Wander::new(id, *area, config)).map(boxed)
            }
            BehaviourSpec::SphereWander { config } => {
                self.checked(SphereWander::new(id, config)).map(boxed)
            }
            BehaviourSpec::Separation { group } => self
                .group(group)
                .map(|members| boxed(Separation::new(id, members))),
            BehaviourSpec::Cohesion {
                group,
                neighbourhood,
            } => self
                .group(group)
                .and_then(|members| self.checked(Cohesion::new(id, members, neighbourhood)))
                .map(boxed),
            BehaviourSpec::Alignment {
                group,
                neighbourhood,
            } => self
                .group(group)
                .and_then(|members| self.checked(Alignment::new(id, members, neighbourhood)))
                .map(boxed),
            BehaviourSpec::ObstacleAvoidance { obstacles, config } => self
                .group(obstacles)
                .and_then(|members| self.checked(ObstacleAvoidance::new(id, members, config)))
                .map(boxed),
            BehaviourSpec::UnalignedCollisionAvoidance { others, config } => self
                .group(others)
                .and_then(|members| {
                    self.checked(UnalignedCollisionAvoidance::new(id, members, config))
                })
                .map(boxed),
            BehaviourSpec::PathFollow { points, config } => self
                .checked(PathFollow::new(id, points.clone(), config))
                .map(boxed),
            BehaviourSpec::Containment { volume, config } => self
                .checked(volume.volume().and_then(|shape| Containment::new(id, shape, config)))
                .map(boxed),
            BehaviourSpec::LeaderFollowing { leader, config } => lookup(self.names, leader)
                .and_then(|leader_id| {
                    self.checked(LeaderFollowing::new(id, leader_id, self.world, config))
                })
                .map(boxed),
            BehaviourSpec::Hide {
                threat,
                obstacles,
                config,
            } => {
                let threat_id = lookup(self.names, threat)?;
                let cover = self.group(obstacles)?;
                self.checked(Hide::new(id, threat_id, cover, self.world, config))
                    .map(boxed)
            }
            BehaviourSpec::BoxExplore { config } => {
                self.checked(BoxExplore::new(id, config)).map(boxed)
            }
            BehaviourSpec::SphereExplore { config } => {
                self.checked(SphereExplore::new(id, config)).map(boxed)
            }
            BehaviourSpec::WallApproach { wall, config } => self
                .checked(wall.caster().and_then(|solid| WallApproach::new(id, solid, config)))
                .map(boxed),
            BehaviourSpec::Compound { children } => self.compound(children).map(boxed),
            BehaviourSpec::BalancedCompound {
                children,
                balancing,
            } => self.balanced(children, *balancing).map(boxed),
            BehaviourSpec::Throttled { strength, inner } => {
                let wrapped = Throttled::new(self.build(inner)?);
                wrapped.strength_handle().set(*strength);
                Ok(boxed(wrapped))
            }
            BehaviourSpec::Queued {
                neighbours,
                config,
                inner,
            } => self.queued(neighbours, config, inner).map(boxed),
        }
    }

    fn compound(&self, children: &[BehaviourSpec]) -> Result<Compound, ScenarioError> {
        let mut compound = Compound::new(self.id);
        for child in children {
            compound.push(self.build(child)?);
        }
        Ok(compound)
    }

    fn balanced(
        &self,
        children: &[BehaviourSpec],
        balancing: bool,
    ) -> Result<BalancedCompound, ScenarioError> {
        let mut compound = BalancedCompound::new(self.id);
        for child in children {
            compound.push(self.build(child)?);
        }
        compound.set_balancing(balancing);
        Ok(compound)
    }

    /// Queuing runs first so its brake applies within the same tick.
    fn queued(
        &self,
        neighbours: &[String],
        config: &QueuingConfig,
        inner: &BehaviourSpec,
    ) -> Result<Compound, ScenarioError> {
        let brake = StrengthHandle::new();
        let queuing = self.checked(Queuing::new(
            self.id,
            self.group(neighbours)?,
            brake.clone(),
            config,
        ))?;
        let throttled = Throttled::with_handle(self.build(inner)?, brake);
        Ok(Compound::new(self.id).with(queuing).with(throttled))
    }
}
