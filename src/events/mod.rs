pub mod effects;
pub mod graph;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::ids::IdType;

macro_rules! event_types {
    ($($variant:ident => $name:literal,)*) => {
        /// Every event class the level format knows about.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum EventType {
            $($variant,)*
        }

        impl EventType {
            pub const ALL: &'static [EventType] = &[$(EventType::$variant,)*];

            pub fn name(self) -> &'static str {
                match self {
                    $(EventType::$variant => $name,)*
                }
            }
        }
    };
}

event_types! {
    Attack => "Attack",
    BoltState => "Bolt_State",
    ContinuousDamage => "Continuous_Damage",
    CyclicTimer => "Cyclic_Timer",
    DropPointMarker => "Drop_Point_Marker",
    Explode => "Explode",
    FollowPlayer => "Follow_Player",
    FollowWaypoints => "Follow_Waypoints",
    GiveItemToPlayer => "Give_Item_To_Player",
    GoalCreate => "Goal_Create",
    GoalCheck => "Goal_Check",
    GoalSet => "Goal_Set",
    Goto => "Goto",
    GotoPlayer => "Goto_Player",
    Heal => "Heal",
    Invert => "Invert",
    LoadLevel => "Load_Level",
    LookAt => "Look_At",
    MakeInvulnerable => "Make_Invulnerable",
    MakeFly => "Make_Fly",
    MakeWalk => "Make_Walk",
    Message => "Message",
    MusicStart => "Music_Start",
    MusicStop => "Music_Stop",
    ParticleState => "Particle_State",
    PlayAnimation => "Play_Animation",
    PlaySound => "Play_Sound",
    SlayObject => "Slay_Object",
    RemoveObject => "Remove_Object",
    SetAiMode => "Set_AI_Mode",
    SetLightState => "Set_Light_State",
    SetLiquidDepth => "Set_Liquid_Depth",
    SetFriendliness => "Set_Friendliness",
    ShakePlayer => "Shake_Player",
    ShootAt => "Shoot_At",
    ShootOnce => "Shoot_Once",
    Armor => "Armor",
    SpawnObject => "Spawn_Object",
    SwapTextures => "Swap_Textures",
    Switch => "Switch",
    SwitchModel => "Switch_Model",
    Teleport => "Teleport",
    WhenDead => "When_Dead",
    SetGravity => "Set_Gravity",
    Alarm => "Alarm",
    AlarmSiren => "Alarm_Siren",
    GoUndercover => "Go_Undercover",
    Delay => "Delay",
    MonitorState => "Monitor_State",
    UnHide => "UnHide",
    PushRegionState => "Push_Region_State",
    WhenHit => "When_Hit",
    HeadlampState => "Headlamp_State",
    ItemPickupState => "Item_Pickup_State",
    Cutscene => "Cutscene",
    StripPlayerWeapons => "Strip_Player_Weapons",
    FogState => "Fog_State",
    Detach => "Detach",
    SkyboxState => "Skybox_State",
    ForceMonitorUpdate => "Force_Monitor_Update",
    BlackOutPlayer => "Black_Out_Player",
    TurnOffPhysics => "Turn_Off_Physics",
    TeleportPlayer => "Teleport_Player",
    HolsterWeapon => "Holster_Weapon",
    HolsterPlayerWeapon => "Holster_Player_Weapon",
    ModifyRotatingMover => "Modify_Rotating_Mover",
    ClearEndgameIfKilled => "Clear_Endgame_If_Killed",
    WinPs2Demo => "Win_PS2_Demo",
    EnableNavpoint => "Enable_Navpoint",
    PlayVclip => "Play_Vclip",
    Endgame => "Endgame",
    MoverPause => "Mover_Pause",
    CountdownBegin => "Countdown_Begin",
    CountdownEnd => "Countdown_End",
    WhenCountdownOver => "When_Countdown_Over",
    ActivateCapekShield => "Activate_Capek_Shield",
    WhenEnterVehicle => "When_Enter_Vehicle",
    WhenTryExitVehicle => "When_Try_Exit_Vehicle",
    FireWeaponNoAnim => "Fire_Weapon_No_Anim",
    NeverLeaveVehicle => "Never_Leave_Vehicle",
    DropWeapon => "Drop_Weapon",
    IgniteEntity => "Ignite_Entity",
    WhenCutsceneOver => "When_Cutscene_Over",
    WhenCountdownReaches => "When_Countdown_Reaches",
    DisplayFullscreenImage => "Display_Fullscreen_Image",
    DefuseNuke => "Defuse_Nuke",
    WhenLifeReaches => "When_Life_Reaches",
    WhenArmorReaches => "When_Armor_Reaches",
    ReverseMover => "Reverse_Mover",
}

static BY_NAME: Lazy<HashMap<String, EventType>> = Lazy::new(|| {
    EventType::ALL
        .iter()
        .map(|kind| (kind.name().to_ascii_lowercase(), *kind))
        .collect()
});

/// How a node reacts to activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorClass {
    /// Fires once at simulation start.
    StartTrigger,
    /// Delays, then re-emits a boolean derived from its input.
    Signal(SignalKind),
    /// Polled every tick; fires on each rising edge of an outside condition.
    Detector,
    /// Delays, performs a one-shot side effect, then forwards.
    Effect,
    /// Delays, then applies a per-tick effect until stopped.
    ContinuousEffect,
    None,
}

/// Output rule of a [`BehaviorClass::Signal`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    Passthrough,
    Invert,
    Toggle,
    /// Re-fires on an interval until cancelled or out of repeats.
    Cyclic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub behavior: BehaviorClass,
    /// Link type the node acts on itself and does not forward activation to.
    pub consumes: IdType,
}

impl Dispatch {
    const fn new(behavior: BehaviorClass, consumes: IdType) -> Self {
        Self { behavior, consumes }
    }
}

/// Dispatch row used for records whose class name is not recognized.
pub const INERT: Dispatch = Dispatch::new(BehaviorClass::None, IdType::None);

impl EventType {
    /// Case-insensitive lookup of a class name from a level file.
    pub fn from_name(name: &str) -> Option<Self> {
        BY_NAME.get(&name.trim().to_ascii_lowercase()).copied()
    }

    /// Whether the record stores an orientation after its links.
    pub fn is_oriented(self) -> bool {
        matches!(
            self,
            EventType::Alarm | EventType::Teleport | EventType::TeleportPlayer | EventType::PlayVclip
        )
    }

    pub fn behavior(self) -> BehaviorClass {
        self.dispatch().behavior
    }

    pub fn dispatch(self) -> Dispatch {
        use BehaviorClass as B;
        use EventType as E;
        use IdType as T;
        match self {
            E::GoalCreate => Dispatch::new(B::StartTrigger, T::None),

            E::Delay => Dispatch::new(B::Signal(SignalKind::Passthrough), T::None),
            E::Invert => Dispatch::new(B::Signal(SignalKind::Invert), T::None),
            E::Switch => Dispatch::new(B::Signal(SignalKind::Toggle), T::None),
            E::CyclicTimer => Dispatch::new(B::Signal(SignalKind::Cyclic), T::None),

            E::WhenDead
            | E::WhenHit
            | E::WhenCountdownOver
            | E::WhenCountdownReaches
            | E::WhenEnterVehicle
            | E::WhenTryExitVehicle
            | E::WhenCutsceneOver
            | E::WhenLifeReaches
            | E::WhenArmorReaches => Dispatch::new(B::Detector, T::None),

            E::ContinuousDamage | E::ShakePlayer | E::AlarmSiren => {
                Dispatch::new(B::ContinuousEffect, T::None)
            }

            E::DropPointMarker | E::WinPs2Demo => INERT,

            E::MoverPause | E::ReverseMover | E::ModifyRotatingMover => {
                Dispatch::new(B::Effect, T::Keyframe)
            }
            E::ParticleState => Dispatch::new(B::Effect, T::ParticleEmitter),
            E::BoltState => Dispatch::new(B::Effect, T::BoltEmitter),
            E::PushRegionState => Dispatch::new(B::Effect, T::PushRegion),
            E::SetLightState => Dispatch::new(B::Effect, T::Light),
            E::RemoveObject | E::SpawnObject | E::UnHide => Dispatch::new(B::Effect, T::All),
            E::GiveItemToPlayer | E::ItemPickupState => Dispatch::new(B::Effect, T::Item),
            E::SwapTextures => Dispatch::new(B::Effect, T::Brush),
            E::MonitorState | E::ForceMonitorUpdate => Dispatch::new(B::Effect, T::Clutter),
            E::Attack
            | E::FollowPlayer
            | E::FollowWaypoints
            | E::Goto
            | E::GotoPlayer
            | E::LookAt
            | E::MakeInvulnerable
            | E::MakeFly
            | E::MakeWalk
            | E::PlayAnimation
            | E::SlayObject
            | E::SetAiMode
            | E::SetFriendliness
            | E::ShootAt
            | E::ShootOnce
            | E::SwitchModel
            | E::Teleport
            | E::Detach
            | E::HolsterWeapon
            | E::ActivateCapekShield
            | E::FireWeaponNoAnim
            | E::NeverLeaveVehicle
            | E::DropWeapon
            | E::IgniteEntity => Dispatch::new(B::Effect, T::Entity),

            E::Explode
            | E::GoalCheck
            | E::GoalSet
            | E::Heal
            | E::LoadLevel
            | E::Message
            | E::MusicStart
            | E::MusicStop
            | E::PlaySound
            | E::SetLiquidDepth
            | E::Armor
            | E::SetGravity
            | E::Alarm
            | E::GoUndercover
            | E::HeadlampState
            | E::Cutscene
            | E::StripPlayerWeapons
            | E::FogState
            | E::SkyboxState
            | E::BlackOutPlayer
            | E::TurnOffPhysics
            | E::TeleportPlayer
            | E::HolsterPlayerWeapon
            | E::ClearEndgameIfKilled
            | E::EnableNavpoint
            | E::PlayVclip
            | E::Endgame
            | E::CountdownBegin
            | E::CountdownEnd
            | E::DisplayFullscreenImage
            | E::DefuseNuke => Dispatch::new(B::Effect, T::None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_case_insensitively() {
        for kind in EventType::ALL {
            assert_eq!(EventType::from_name(kind.name()), Some(*kind));
        }
        assert_eq!(EventType::from_name("mover_pause"), Some(EventType::MoverPause));
        assert_eq!(EventType::from_name(" Delay "), Some(EventType::Delay));
        assert_eq!(EventType::from_name("Not_An_Event"), None);
    }

    #[test]
    fn table_covers_the_full_enumeration() {
        assert_eq!(EventType::ALL.len(), 89);
        let starts = EventType::ALL
            .iter()
            .filter(|kind| kind.behavior() == BehaviorClass::StartTrigger)
            .count();
        assert_eq!(starts, 1);
    }

    #[test]
    fn mover_effects_consume_keyframe_links() {
        assert_eq!(EventType::MoverPause.dispatch().consumes, IdType::Keyframe);
        assert_eq!(EventType::ReverseMover.dispatch().consumes, IdType::Keyframe);
        assert_eq!(EventType::Message.dispatch().consumes, IdType::None);
    }

    #[test]
    fn signal_sub_types() {
        assert_eq!(
            EventType::Invert.behavior(),
            BehaviorClass::Signal(SignalKind::Invert)
        );
        assert_eq!(
            EventType::CyclicTimer.behavior(),
            BehaviorClass::Signal(SignalKind::Cyclic)
        );
        assert_eq!(EventType::WhenDead.behavior(), BehaviorClass::Detector);
    }
}
