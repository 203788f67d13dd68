//! Thread-decoupled chain segment with bounded buffering.
//!
//! [`ParallelModule`] moves a backward sub-chain onto a worker thread. The
//! worker runs the sub-chain's processing passes ahead of the consumer and
//! parks the results in a bounded queue, so a slow forward stage (a device
//! callback, a network writer) no longer stalls generation, and a slow
//! backward stage gets a head start. Buffer order is pull order: the queue
//! is strictly FIFO and the worker is single, so the consumer sees buffers
//! exactly as the sub-chain produced them.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::buffer::SampleBuffer;
use crate::chain::{ChainModule, ensure_processable};
use crate::error::{ChainError, Result};
use crate::info::{ChainInfo, ModuleInfo};
use crate::module::{ModuleBase, State};

/// Default bound on buffers queued ahead of the consumer.
pub const DEFAULT_QUEUE_SIZE: usize = 10;

/// The sub-chain while it lives on the worker thread.
struct Worker {
    chain: Box<dyn ChainModule + Send>,
    /// Produced buffers travel to the consumer here.
    data_tx: Sender<SampleBuffer>,
    /// One ticket per free queue slot. The worker takes a ticket before
    /// it processes; the consumer returns one per buffer taken. Tickets
    /// gate *work*, not just delivery: a full queue idles the sub-chain
    /// instead of racing ahead.
    slot_rx: Receiver<()>,
}

impl Worker {
    fn run(mut self) -> (Box<dyn ChainModule + Send>, Result<()>) {
        loop {
            // Consumer dropped its ticket sender: shut down.
            let Ok(()) = self.slot_rx.recv() else {
                return (self.chain, Ok(()));
            };
            if let Err(err) = self.produce() {
                return (self.chain, Err(err));
            }
        }
    }

    fn produce(&mut self) -> Result<()> {
        self.chain.meta_process()?;
        let buf = self
            .chain
            .take_buffer()
            .ok_or(ChainError::MissingBuffer)?;
        // A send error means the consumer is gone; the missing ticket on
        // the next loop turn ends the worker anyway.
        let _ = self.data_tx.send(buf);
        Ok(())
    }
}

enum WorkerState {
    /// Sub-chain held inline; no thread yet.
    Idle(Box<dyn ChainModule + Send>),
    /// Sub-chain running on the worker thread.
    Running {
        handle: JoinHandle<(Box<dyn ChainModule + Send>, Result<()>)>,
        data_rx: Receiver<SampleBuffer>,
        slot_tx: Sender<()>,
    },
    /// Transient marker while swapping states.
    Detached,
}

/// Runs its backward sub-chain on a dedicated thread, up to `queue_size`
/// buffers ahead of the consumer.
///
/// The sub-chain must be `Send`; it is moved onto the worker at
/// [`meta_start`](ChainModule::meta_start) and moved back at
/// [`meta_stop`](ChainModule::meta_stop), so configuration access and
/// re-linking are available again after a stop. Between start and stop the
/// sub-chain is unreachable from this side.
///
/// After a stop, buffers the worker had already queued remain consumable:
/// [`meta_process`](ChainModule::meta_process) keeps draining them and
/// fails with [`ChainError::Shutdown`] once the queue is empty.
pub struct ParallelModule {
    base: ModuleBase,
    queue_size: usize,
    worker: WorkerState,
    /// Buffers drained from the queue when the worker stopped.
    leftovers: std::collections::VecDeque<SampleBuffer>,
    /// Finish was requested while the sub-chain ran on the worker; applied
    /// when the sub-chain is joined back.
    finish_pending: bool,
}

impl ParallelModule {
    /// Decouples `chain` behind a queue of [`DEFAULT_QUEUE_SIZE`] buffers.
    pub fn new(chain: impl ChainModule + Send + 'static) -> Self {
        Self::with_queue_size(chain, DEFAULT_QUEUE_SIZE)
    }

    /// Decouples `chain` behind a queue of `queue_size` buffers.
    ///
    /// # Panics
    ///
    /// Panics if `queue_size` is zero.
    pub fn with_queue_size(chain: impl ChainModule + Send + 'static, queue_size: usize) -> Self {
        assert!(queue_size > 0, "parallel queue needs at least one slot");
        Self {
            base: ModuleBase::new(),
            queue_size,
            worker: WorkerState::Idle(Box::new(chain)),
            leftovers: std::collections::VecDeque::new(),
            finish_pending: false,
        }
    }

    /// Bound on buffers queued ahead of the consumer.
    pub fn queue_size(&self) -> usize {
        self.queue_size
    }

    /// The sub-chain, when it is not running on the worker.
    pub fn chain(&self) -> Option<&(dyn ChainModule + Send)> {
        match &self.worker {
            WorkerState::Idle(chain) => Some(chain.as_ref()),
            _ => None,
        }
    }

    /// Mutable access to the sub-chain, when it is not running.
    pub fn chain_mut(&mut self) -> Option<&mut (dyn ChainModule + Send)> {
        match &mut self.worker {
            WorkerState::Idle(chain) => Some(chain.as_mut()),
            _ => None,
        }
    }

    fn spawn(&mut self) -> Result<()> {
        let WorkerState::Idle(chain) = std::mem::replace(&mut self.worker, WorkerState::Detached)
        else {
            // Already running; nothing to spawn.
            return Ok(());
        };
        let (data_tx, data_rx) = bounded(self.queue_size);
        let (slot_tx, slot_rx) = bounded(self.queue_size);
        for _ in 0..self.queue_size {
            // Pre-filled tickets let the worker run ahead immediately.
            let _ = slot_tx.send(());
        }
        let worker = Worker {
            chain,
            data_tx,
            slot_rx,
        };
        let handle = thread::Builder::new()
            .name("cadena-parallel".into())
            .spawn(move || worker.run())
            .map_err(|_| ChainError::Shutdown)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(queue_size = self.queue_size, "parallel worker spawned");
        self.worker = WorkerState::Running {
            handle,
            data_rx,
            slot_tx,
        };
        Ok(())
    }

    /// Stops the worker and moves the sub-chain back inline. Queued
    /// buffers are kept for draining.
    fn join(&mut self) -> Result<()> {
        let WorkerState::Running {
            handle,
            data_rx,
            slot_tx,
        } = std::mem::replace(&mut self.worker, WorkerState::Detached)
        else {
            return Ok(());
        };
        // Dropping the ticket sender wakes the worker into shutdown.
        drop(slot_tx);
        self.leftovers.extend(data_rx.try_iter());
        let (chain, outcome) = handle.join().map_err(|_| ChainError::Shutdown)?;
        // Anything sent between the drain above and the join.
        self.leftovers.extend(data_rx.try_iter());
        #[cfg(feature = "tracing")]
        tracing::debug!(leftovers = self.leftovers.len(), "parallel worker joined");
        self.worker = WorkerState::Idle(chain);
        outcome
    }
}

impl ChainModule for ParallelModule {
    fn meta_process(&mut self) -> Result<()> {
        // Leftovers stay consumable even after the module stopped.
        if let Some(buf) = self.leftovers.pop_front() {
            self.base.set_buffer(buf);
            return Ok(());
        }
        if self.base.state() == State::Stopped {
            return Err(ChainError::Shutdown);
        }
        ensure_processable(self.base.state())?;
        let received = {
            let WorkerState::Running {
                data_rx, slot_tx, ..
            } = &self.worker
            else {
                return Err(ChainError::Shutdown);
            };
            match data_rx.recv() {
                Ok(buf) => {
                    // Freeing the slot lets the worker produce the replacement.
                    let _ = slot_tx.send(());
                    Some(buf)
                }
                Err(_) => None,
            }
        };
        match received {
            Some(buf) => {
                self.base.set_buffer(buf);
                Ok(())
            }
            None => {
                // The worker exited on its own, so `produce` must have
                // failed. Joining surfaces the sub-chain's error here
                // instead of a blanket shutdown.
                self.join()?;
                Err(ChainError::Shutdown)
            }
        }
    }

    fn meta_start(&mut self) -> Result<()> {
        if let WorkerState::Idle(chain) = &mut self.worker {
            chain.meta_start()?;
        }
        self.spawn()?;
        self.base.advance(State::Started)
    }

    fn meta_stop(&mut self) -> Result<()> {
        self.join()?;
        if let WorkerState::Idle(chain) = &mut self.worker {
            if self.finish_pending {
                self.finish_pending = false;
                chain.meta_finish()?;
            }
            chain.meta_stop()?;
        }
        self.base.advance(State::Stopped)
    }

    fn meta_finish(&mut self) -> Result<()> {
        match &mut self.worker {
            WorkerState::Idle(chain) => chain.meta_finish()?,
            // The sub-chain runs on the worker; finishing it from this
            // thread would race processing. Record the request and apply
            // it once the sub-chain is joined back at stop.
            _ => self.finish_pending = true,
        }
        self.base.advance(State::Finishing)?;
        self.base.advance(State::Finished)
    }

    fn meta_info_sync(&mut self, forward: &ModuleInfo, chain: &mut ChainInfo) -> Result<()> {
        self.base.set_info(forward.clone());
        chain.modules += 1;
        let own = self.base.info().clone();
        match &mut self.worker {
            WorkerState::Idle(sub) => sub.meta_info_sync(&own, chain),
            // Topology must be fixed before start.
            _ => Err(ChainError::NotInState {
                required: State::Created,
                actual: self.base.state(),
            }),
        }
    }

    fn take_buffer(&mut self) -> Option<SampleBuffer> {
        self.base.take_buffer()
    }

    fn state(&self) -> State {
        self.base.state()
    }

    fn head_info(&self) -> ModuleInfo {
        self.base.info().clone()
    }

    fn module_count(&self) -> usize {
        match &self.worker {
            WorkerState::Idle(chain) => 1 + chain.module_count(),
            _ => 1,
        }
    }

    fn finished_modules(&self) -> usize {
        let own = usize::from(self.base.state() >= State::Finished);
        match &self.worker {
            WorkerState::Idle(chain) => own + chain.finished_modules(),
            _ => own,
        }
    }
}

impl Drop for ParallelModule {
    fn drop(&mut self) {
        // Worker threads must not outlive the module.
        let _ = self.join();
    }
}
