//! Doors between subrooms (`Transition`) and internal passages (`Crossing`).

use ped_core::{AgentId, CrossingId, LineSegment, RoomId, SubRoomId, TransitionId};

// ── DoorState ─────────────────────────────────────────────────────────────────

/// The state of a transition.
///
/// `TempClose` is a door that will open again (outflow regulation, waiting
/// areas); agents heading for it wait instead of rerouting.  `Close` is
/// final for routing purposes: the door is treated as a wall.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DoorState {
    Open,
    TempClose,
    Close,
}

// ── FlowRecord ────────────────────────────────────────────────────────────────

/// One point of a door's flow curve: who crossed, when, and the cumulative
/// count at that moment.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FlowRecord {
    pub time: f64,
    pub cumulative: u64,
    pub agent: AgentId,
}

// ── Transition ────────────────────────────────────────────────────────────────

/// A door segment between two subrooms, or from a subroom to outside.
#[derive(Clone, Debug)]
pub struct Transition {
    pub id: TransitionId,
    pub segment: LineSegment,
    /// The subroom on the near side.
    pub from: (RoomId, SubRoomId),
    /// The subroom on the far side; `None` means the door leads outside.
    pub to: Option<(RoomId, SubRoomId)>,

    state: DoorState,
    /// Cumulative number of agents that have crossed this door.
    door_usage: u64,
    /// Elapsed time of the most recent crossing; negative if never crossed.
    last_passing_time: f64,
    /// Maximum allowed passings per second; `None` = unregulated.
    pub outflow_rate: Option<f64>,
    /// Close the door for good once this many agents have passed.
    pub max_door_usage: Option<u64>,
    /// Set while the flow regulator (not an event) holds the door shut, so
    /// the regulator only reopens doors it closed itself.
    pub(crate) regulator_closed: bool,
    flow_curve: Vec<FlowRecord>,
}

impl Transition {
    pub fn new(
        id: TransitionId,
        segment: LineSegment,
        from: (RoomId, SubRoomId),
        to: Option<(RoomId, SubRoomId)>,
    ) -> Self {
        Self {
            id,
            segment,
            from,
            to,
            state: DoorState::Open,
            door_usage: 0,
            last_passing_time: -1.0,
            outflow_rate: None,
            max_door_usage: None,
            regulator_closed: false,
            flow_curve: Vec::new(),
        }
    }

    #[inline]
    pub fn state(&self) -> DoorState {
        self.state
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.state == DoorState::Open
    }

    #[inline]
    pub fn is_temp_closed(&self) -> bool {
        self.state == DoorState::TempClose
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state == DoorState::Close
    }

    pub fn open(&mut self) {
        self.state = DoorState::Open;
        self.regulator_closed = false;
    }

    pub fn temp_close(&mut self) {
        self.state = DoorState::TempClose;
    }

    pub fn close(&mut self) {
        self.state = DoorState::Close;
        self.regulator_closed = false;
    }

    /// Reset usage statistics (the `ResetDoor` event): the door reopens and
    /// counters start from zero.
    pub fn reset(&mut self) {
        self.open();
        self.door_usage = 0;
        self.last_passing_time = -1.0;
        self.flow_curve.clear();
    }

    #[inline]
    pub fn door_usage(&self) -> u64 {
        self.door_usage
    }

    #[inline]
    pub fn last_passing_time(&self) -> f64 {
        self.last_passing_time
    }

    pub fn flow_curve(&self) -> &[FlowRecord] {
        &self.flow_curve
    }

    /// Record that `agent` crossed the door at `time`.
    pub fn record_passing(&mut self, time: f64, agent: AgentId) {
        self.door_usage += 1;
        self.last_passing_time = time;
        self.flow_curve.push(FlowRecord {
            time,
            cumulative: self.door_usage,
            agent,
        });
    }

    /// `true` if one of the door's sides is the given subroom.
    pub fn touches(&self, room: RoomId, subroom: SubRoomId) -> bool {
        self.from == (room, subroom) || self.to == Some((room, subroom))
    }
}

// ── Crossing ──────────────────────────────────────────────────────────────────

/// An always-open internal passage between two subrooms of the same room.
///
/// Crossings carry usage statistics like transitions but have no door state.
#[derive(Clone, Debug)]
pub struct Crossing {
    pub id: CrossingId,
    pub segment: LineSegment,
    pub room: RoomId,
    pub subroom1: SubRoomId,
    pub subroom2: SubRoomId,

    door_usage: u64,
    last_passing_time: f64,
}

impl Crossing {
    pub fn new(
        id: CrossingId,
        segment: LineSegment,
        room: RoomId,
        subroom1: SubRoomId,
        subroom2: SubRoomId,
    ) -> Self {
        Self {
            id,
            segment,
            room,
            subroom1,
            subroom2,
            door_usage: 0,
            last_passing_time: -1.0,
        }
    }

    #[inline]
    pub fn door_usage(&self) -> u64 {
        self.door_usage
    }

    #[inline]
    pub fn last_passing_time(&self) -> f64 {
        self.last_passing_time
    }

    pub fn record_passing(&mut self, time: f64) {
        self.door_usage += 1;
        self.last_passing_time = time;
    }

    pub fn touches(&self, room: RoomId, subroom: SubRoomId) -> bool {
        self.room == room && (self.subroom1 == subroom || self.subroom2 == subroom)
    }
}
