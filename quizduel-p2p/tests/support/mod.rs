use instant::{Duration, Instant};
use quizduel_core::{GameEvent, GameState, Question, Quiz};
use quizduel_p2p::{
    Envelope, GameLoop, MemoryConnection, MemoryHub, MessageBody, PeerId, SessionEvent,
    SyncConfig,
};
use std::sync::{Arc, Mutex, Once};

static TRACING: Once = Once::new();

/// Log to the test harness; `RUST_LOG` picks the level
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Quiz whose every correct answer is "A"
pub fn quiz(questions: usize) -> Quiz {
    let questions = (0..questions)
        .map(|i| {
            Question::multiple_choice(
                format!("Question {}", i + 1),
                &[("A", "right"), ("B", "wrong"), ("C", "wrong"), ("D", "wrong")],
                "A",
            )
        })
        .collect();
    Quiz::new("Fixture Quiz", questions)
}

/// Frames seen on the hub, in send order
pub type FrameLog = Arc<Mutex<Vec<(PeerId, Envelope)>>>;

/// Host and guest wired through one memory hub, driven by a manual clock
pub struct MatchFixture {
    pub host: GameLoop<MemoryConnection>,
    pub guest: GameLoop<MemoryConnection>,
    pub hub: MemoryHub,
    pub now: Instant,
    pub host_events: Vec<SessionEvent>,
    pub guest_events: Vec<SessionEvent>,
}

impl MatchFixture {
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    /// Connected and past `player-joined` on both sides
    pub fn with_config(config: SyncConfig) -> Self {
        init_tracing();

        let hub = MemoryHub::new();
        let mut host = GameLoop::new(hub.endpoint(), config.clone());
        let mut guest = GameLoop::new(hub.endpoint(), config);

        let host_id = host.become_host().unwrap();
        guest.connect_to_peer(&host_id).unwrap();

        let mut fixture = Self {
            host,
            guest,
            hub,
            now: Instant::now(),
            host_events: Vec::new(),
            guest_events: Vec::new(),
        };
        fixture.settle();

        assert_eq!(fixture.host.session().state(), GameState::Ready);
        assert_eq!(fixture.guest.session().state(), GameState::Ready);
        fixture
    }

    pub fn host_id(&self) -> PeerId {
        self.host.local_peer_id().unwrap()
    }

    pub fn guest_id(&self) -> PeerId {
        self.guest.local_peer_id().unwrap()
    }

    /// Host polls, then guest, at the current clock reading
    pub fn tick(&mut self) {
        self.host.poll_at(self.now);
        self.guest.poll_at(self.now);
        self.host_events.extend(self.host.drain_events());
        self.guest_events.extend(self.guest.drain_events());
    }

    /// Enough ticks for a message and its ack to make the round trip
    pub fn settle(&mut self) {
        for _ in 0..3 {
            self.tick();
        }
    }

    /// Jump the clock, then settle
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
        self.settle();
    }

    /// Walk the clock forward in `step`s, settling after each
    pub fn run_for(&mut self, total: Duration, step: Duration) {
        let end = self.now + total;
        while self.now < end {
            self.advance(step);
        }
    }

    pub fn start(&mut self, questions: usize) {
        self.host.start_game(quiz(questions)).unwrap();
        self.settle();
        assert_eq!(self.guest.session().state(), GameState::Playing);
    }

    /// Record every frame; drop those matching `lose`
    pub fn tap<F>(&self, mut lose: F) -> FrameLog
    where
        F: FnMut(&PeerId, &Envelope) -> bool + Send + 'static,
    {
        let log: FrameLog = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();

        self.hub.set_drop_filter(move |sender, data| {
            let Ok(envelope) = Envelope::from_bytes(data) else {
                return false;
            };
            let dropped = lose(sender, &envelope);
            sink.lock().unwrap().push((sender.clone(), envelope));
            dropped
        });

        log
    }

    /// Drop frames of kind `kind` sent by `from`, the first `times` of them
    pub fn drop_first(&self, from: PeerId, kind: &'static str, times: usize) -> FrameLog {
        let mut remaining = times;
        self.tap(move |sender, envelope| {
            if sender == &from && envelope.body.kind() == kind && remaining > 0 {
                remaining -= 1;
                return true;
            }
            false
        })
    }

    /// Drop every frame of kind `kind` sent by `from`
    pub fn drop_all(&self, from: PeerId, kind: &'static str) -> FrameLog {
        self.tap(move |sender, envelope| sender == &from && envelope.body.kind() == kind)
    }

    pub fn host_game_events(&self) -> Vec<GameEvent> {
        game_events(&self.host_events)
    }

    pub fn guest_game_events(&self) -> Vec<GameEvent> {
        game_events(&self.guest_events)
    }
}

pub fn game_events(events: &[SessionEvent]) -> Vec<GameEvent> {
    events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::Game(game) => Some(game.clone()),
            _ => None,
        })
        .collect()
}

/// Frames from `from` matching `pred`
pub fn frames_from<F>(log: &FrameLog, from: &PeerId, pred: F) -> Vec<Envelope>
where
    F: Fn(&MessageBody) -> bool,
{
    log.lock()
        .unwrap()
        .iter()
        .filter(|(sender, envelope)| sender == from && pred(&envelope.body))
        .map(|(_, envelope)| envelope.clone())
        .collect()
}
