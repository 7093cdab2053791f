//! MQTT subscription on a dedicated thread.
//!
//! The thread owns the rumqttc connection and feeds every publish through
//! an [`Ingestor`]. There is no automatic reconnect: on a connection error
//! the thread logs, stops, and reports the error from
//! [`Subscriber::shutdown`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rumqttc::{Client, Connection, Event, MqttOptions, Outgoing, Packet, QoS};

use crate::config::BusConfig;
use crate::error::BusError;
use crate::ingestor::Ingestor;

/// Handle to a running subscriber thread.
pub struct Subscriber {
    client: Client,
    stopping: Arc<AtomicBool>,
    handle: JoinHandle<Result<(), BusError>>,
}

impl Subscriber {
    /// Connect (asynchronously, on the new thread) and subscribe to the
    /// configured filter with at-least-once delivery.
    pub fn spawn(config: &BusConfig, ingestor: Ingestor) -> Result<Self, BusError> {
        config.validate()?;

        let client_id = config.client_id();
        let mut options = MqttOptions::new(client_id.clone(), config.host.clone(), config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
        options.set_clean_session(true);

        let (client, connection) = Client::new(options, config.request_capacity);
        client
            .subscribe(config.topic.clone(), QoS::AtLeastOnce)
            .map_err(|source| BusError::Subscribe {
                topic: config.topic.clone(),
                source,
            })?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            topic = %config.topic,
            client_id = %client_id,
            "starting MQTT subscriber"
        );

        let stopping = Arc::new(AtomicBool::new(false));
        let worker = Worker {
            host: config.host.clone(),
            port: config.port,
            ingestor,
            stopping: Arc::clone(&stopping),
        };
        let handle = thread::Builder::new()
            .name("beltline-mqtt".into())
            .spawn(move || worker.run(connection))
            .map_err(BusError::Spawn)?;

        Ok(Self {
            client,
            stopping,
            handle,
        })
    }

    /// Whether the subscriber thread has exited (error or shutdown).
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Disconnect, wait for the thread, and return how it ended.
    pub fn shutdown(self) -> Result<(), BusError> {
        self.stopping.store(true, Ordering::SeqCst);
        if !self.handle.is_finished() {
            if let Err(err) = self.client.disconnect() {
                tracing::debug!(%err, "disconnect request not delivered");
            }
        }
        self.handle.join().map_err(|_| BusError::ThreadPanicked)?
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("finished", &self.handle.is_finished())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Whether the event loop should keep going after a notification.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

struct Worker {
    host: String,
    port: u16,
    ingestor: Ingestor,
    stopping: Arc<AtomicBool>,
}

impl Worker {
    fn run(self, mut connection: Connection) -> Result<(), BusError> {
        for notification in connection.iter() {
            match notification {
                Ok(event) => {
                    if self.on_event(event)? == Flow::Stop {
                        return Ok(());
                    }
                }
                Err(source) => {
                    if self.stopping.load(Ordering::SeqCst) {
                        tracing::info!("MQTT subscriber stopped");
                        return Ok(());
                    }
                    tracing::warn!(host = %self.host, port = self.port, %source, "MQTT connection lost");
                    return Err(BusError::Connect {
                        host: self.host,
                        port: self.port,
                        source,
                    });
                }
            }
        }
        Ok(())
    }

    fn on_event(&self, event: Event) -> Result<Flow, BusError> {
        match event {
            Event::Incoming(Packet::ConnAck(ack)) => {
                tracing::info!(host = %self.host, port = self.port, code = ?ack.code, "connected to broker");
            }
            Event::Incoming(Packet::SubAck(ack)) => {
                tracing::info!(return_codes = ?ack.return_codes, "subscription acknowledged");
            }
            Event::Incoming(Packet::Publish(publish)) => {
                self.ingestor.handle(&publish.topic, &publish.payload);
                if self.ingestor.is_disconnected() {
                    tracing::warn!("simulation receiver gone, stopping subscriber");
                    return Err(BusError::ChannelClosed);
                }
            }
            Event::Incoming(Packet::Disconnect) => {
                tracing::warn!("broker sent disconnect");
                return Ok(Flow::Stop);
            }
            Event::Outgoing(Outgoing::Disconnect) => return Ok(Flow::Stop),
            _ => {}
        }
        Ok(Flow::Continue)
    }
}
