//! In-process topic system
//!
//! Typed pub/sub channels carrying flush events from the ingestion edge to
//! the stats pipeline. Publishing is bounded by a byte budget so a stalled
//! consumer surfaces as backpressure instead of unbounded memory growth.
//! Dispatchers drain their queues on shutdown so accepted events still reach
//! subscribers.

mod error;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

pub use error::TopicError;

use crate::core::constants::{
    DEFAULT_TOPIC_BUFFER_SIZE, DEFAULT_TOPIC_CHANNEL_CAPACITY, ENV_TOPIC_BUFFER_SIZE,
    ENV_TOPIC_CHANNEL_CAPACITY,
};

// ============================================================================
// TOPIC MESSAGE TRAIT
// ============================================================================

/// Trait for messages that can be published to topics
pub trait TopicMessage: Clone + Send + Sync + 'static {
    /// Estimate message size in bytes for backpressure
    fn size_bytes(&self) -> usize;
}

// Note: the TopicMessage implementation for FlushEvent lives in domain/mod.rs
// next to the pipeline that consumes it.

// ============================================================================
// TOPIC CONFIG
// ============================================================================

/// Topic configuration
#[derive(Clone)]
pub struct TopicConfig {
    pub buffer_size: usize,
    pub channel_capacity: usize,
}

impl Default for TopicConfig {
    fn default() -> Self {
        let buffer_size = std::env::var(ENV_TOPIC_BUFFER_SIZE)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TOPIC_BUFFER_SIZE);

        let channel_capacity = std::env::var(ENV_TOPIC_CHANNEL_CAPACITY)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TOPIC_CHANNEL_CAPACITY);

        Self {
            buffer_size,
            channel_capacity,
        }
    }
}

// ============================================================================
// PUBLISHER / SUBSCRIBER
// ============================================================================

/// Publisher handle for a topic - clone and share across producers
#[derive(Clone, Debug)]
pub struct Publisher<T: TopicMessage> {
    tx: mpsc::Sender<T>,
    buffer_bytes: Arc<AtomicUsize>,
    max_bytes: usize,
}

impl<T: TopicMessage> Publisher<T> {
    /// Publish message (returns error if buffer full)
    pub fn publish(&self, msg: T) -> Result<(), TopicError> {
        let msg_size = msg.size_bytes();

        // Atomic CAS to reserve buffer space
        loop {
            let current = self.buffer_bytes.load(Ordering::Relaxed);
            if current + msg_size > self.max_bytes {
                return Err(TopicError::BufferFull);
            }
            if self
                .buffer_bytes
                .compare_exchange(
                    current,
                    current + msg_size,
                    Ordering::SeqCst,
                    Ordering::Relaxed,
                )
                .is_ok()
            {
                break;
            }
        }

        self.tx.try_send(msg).map_err(|_| {
            self.buffer_bytes.fetch_sub(msg_size, Ordering::SeqCst);
            TopicError::ChannelClosed
        })
    }
}

/// Subscriber handle for a topic
pub struct Subscriber<T: TopicMessage> {
    rx: broadcast::Receiver<T>,
}

impl<T: TopicMessage> Subscriber<T> {
    pub async fn recv(&mut self) -> Result<T, TopicError> {
        self.rx.recv().await.map_err(|e| e.into())
    }
}

// ============================================================================
// TOPIC INNER
// ============================================================================

/// A single topic instance
struct TopicInner<T: TopicMessage> {
    broadcast_tx: broadcast::Sender<T>,
    publisher: Publisher<T>,
}

/// Type-erased topic storage
trait AnyTopic: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: TopicMessage> AnyTopic for TopicInner<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

type TopicMap = HashMap<String, (TypeId, Arc<dyn AnyTopic>)>;

/// Dispatcher entry with shutdown control
struct DispatcherEntry {
    handle: JoinHandle<()>,
    shutdown_tx: oneshot::Sender<()>,
}

// ============================================================================
// TOPIC SERVICE
// ============================================================================

/// Central topic service - manages all topics
pub struct TopicService {
    topics: RwLock<TopicMap>,
    dispatchers: RwLock<Vec<DispatcherEntry>>,
    default_config: TopicConfig,
}

impl TopicService {
    /// Create a new topic service
    pub fn new() -> Self {
        Self::with_config(TopicConfig::default())
    }

    /// Create with custom config
    pub fn with_config(config: TopicConfig) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            dispatchers: RwLock::new(Vec::new()),
            default_config: config,
        }
    }

    /// Create a new topic or get the existing one
    pub fn topic<T: TopicMessage>(&self, name: &str) -> Result<Topic<T>, TopicError> {
        let type_id = TypeId::of::<T>();

        // Hold write lock to prevent race conditions
        let mut topics = self.topics.write();

        // Check if topic exists
        if let Some((existing_type, topic)) = topics.get(name) {
            if *existing_type == type_id {
                let inner = topic.as_any().downcast_ref::<TopicInner<T>>().unwrap();
                return Ok(Topic {
                    name: name.to_string(),
                    publisher: inner.publisher.clone(),
                    broadcast_tx: inner.broadcast_tx.clone(),
                });
            }
            return Err(TopicError::TypeMismatch(name.to_string()));
        }

        // Create new topic
        let config = self.default_config.clone();
        let (mpsc_tx, mpsc_rx) = mpsc::channel(config.channel_capacity);
        let (broadcast_tx, _) = broadcast::channel(config.channel_capacity);
        let buffer_bytes = Arc::new(AtomicUsize::new(0));

        let publisher = Publisher {
            tx: mpsc_tx,
            buffer_bytes: buffer_bytes.clone(),
            max_bytes: config.buffer_size,
        };

        let inner = TopicInner {
            broadcast_tx: broadcast_tx.clone(),
            publisher: publisher.clone(),
        };

        // Start dispatcher with shutdown signal and track entry
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle =
            Self::start_dispatcher(mpsc_rx, broadcast_tx.clone(), buffer_bytes, shutdown_rx);
        self.dispatchers.write().push(DispatcherEntry {
            handle,
            shutdown_tx,
        });

        // Store topic
        topics.insert(name.to_string(), (type_id, Arc::new(inner)));

        Ok(Topic {
            name: name.to_string(),
            publisher,
            broadcast_tx,
        })
    }

    fn start_dispatcher<T: TopicMessage>(
        mut rx: mpsc::Receiver<T>,
        broadcast_tx: broadcast::Sender<T>,
        buffer_bytes: Arc<AtomicUsize>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    // Check for shutdown signal
                    _ = &mut shutdown_rx => {
                        // Drain remaining messages before exiting
                        while let Ok(msg) = rx.try_recv() {
                            let msg_size = msg.size_bytes();
                            let _ = broadcast_tx.send(msg);
                            buffer_bytes.fetch_sub(msg_size, Ordering::SeqCst);
                        }
                        break;
                    }
                    // Process incoming messages
                    msg = rx.recv() => {
                        match msg {
                            Some(msg) => {
                                let msg_size = msg.size_bytes();
                                let _ = broadcast_tx.send(msg);
                                buffer_bytes.fetch_sub(msg_size, Ordering::SeqCst);
                            }
                            None => break, // Channel closed
                        }
                    }
                }
            }
        })
    }

    /// Get a publisher for an existing topic (does NOT create the topic)
    /// Returns None if topic doesn't exist or type mismatch
    pub fn get_publisher<T: TopicMessage>(&self, name: &str) -> Option<Publisher<T>> {
        let type_id = TypeId::of::<T>();
        let topics = self.topics.read();

        if let Some((existing_type, topic)) = topics.get(name)
            && *existing_type == type_id
        {
            let inner = topic.as_any().downcast_ref::<TopicInner<T>>().unwrap();
            return Some(inner.publisher.clone());
        }
        None
    }

    /// Gracefully shutdown all dispatcher tasks
    ///
    /// Signals each dispatcher to drain its mpsc channel, then waits for
    /// the drain to finish so accepted flush events still reach subscribers.
    pub async fn shutdown(&self) {
        let entries: Vec<_> = {
            let mut guard = self.dispatchers.write();
            std::mem::take(&mut *guard)
        };

        let mut handles = Vec::new();
        for entry in entries {
            let _ = entry.shutdown_tx.send(());
            handles.push(entry.handle);
        }

        for handle in handles {
            let _ = handle.await;
        }
    }
}

impl Default for TopicService {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TOPIC HANDLE
// ============================================================================

/// Handle to a specific topic
#[derive(Clone)]
pub struct Topic<T: TopicMessage> {
    name: String,
    publisher: Publisher<T>,
    broadcast_tx: broadcast::Sender<T>,
}

impl<T: TopicMessage> Topic<T> {
    /// Get a publisher for this topic
    pub fn publisher(&self) -> Publisher<T> {
        self.publisher.clone()
    }

    /// Subscribe to this topic
    pub fn subscribe(&self) -> Subscriber<T> {
        Subscriber {
            rx: self.broadcast_tx.subscribe(),
        }
    }

    /// Publish directly via topic handle
    pub fn publish(&self, msg: T) -> Result<(), TopicError> {
        self.publisher.publish(msg)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// TESTS
// ============================================================================
