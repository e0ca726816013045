use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use algojobs_model::{Embedder, ModelError, ModelInfo};
use ndarray::{Array2, Axis};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::EngineError;

type InferenceOutput = Array2<f32>;

/// The message sent from a request handler to the worker.
pub(crate) struct InferenceJob {
    pub texts: Vec<String>,
    pub batch_size: usize,
    pub result_sender: oneshot::Sender<Result<InferenceOutput, EngineError>>,
}

/// Owns the model and drains the job queue on its own OS thread.
pub struct InferenceWorker {
    receiver: mpsc::Receiver<InferenceJob>,
    model: Arc<dyn Embedder>,
}

impl InferenceWorker {
    /// Starts the worker thread and returns the handle used to submit jobs.
    ///
    /// Submitters wait once `queue_capacity` jobs are pending.
    pub fn spawn(model: Arc<dyn Embedder>, queue_capacity: usize) -> Result<InferenceHandle, EngineError> {
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let info = Arc::new(model.info().clone());
        let worker = Self { receiver, model };

        thread::Builder::new()
            .name("inference-worker".into())
            .spawn(move || worker.run())?;

        Ok(InferenceHandle { sender, info })
    }

    fn run(mut self) {
        info!(model = %self.model.info().name, "Inference worker started");

        while let Some(job) = self.receiver.blocking_recv() {
            let result = self.process(&job.texts, job.batch_size);
            // The requester may have gone away; nothing to do then.
            let _ = job.result_sender.send(result);
        }

        info!("Inference worker stopped");
    }

    fn process(&self, texts: &[String], batch_size: usize) -> Result<InferenceOutput, EngineError> {
        let started = Instant::now();
        let model = self.model.as_ref();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| encode_batched(model, texts, batch_size)));
        let result = match outcome {
            Ok(result) => result.map_err(EngineError::from),
            Err(payload) => {
                let message = panic_message(payload);
                error!(error = %message, "Model panicked during inference");
                Err(EngineError::Panicked(message))
            }
        };

        debug!(
            texts = texts.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Inference job finished"
        );
        result
    }
}

/// Embeds `texts` in chunks of `batch_size` and stacks the rows in order.
pub(crate) fn encode_batched(
    model: &dyn Embedder,
    texts: &[String],
    batch_size: usize,
) -> Result<InferenceOutput, ModelError> {
    let batch_size = batch_size.max(1);

    let output = if texts.len() <= batch_size {
        model.embed(texts)?
    } else {
        let parts = texts
            .chunks(batch_size)
            .map(|chunk| model.embed(chunk))
            .collect::<Result<Vec<_>, _>>()?;
        let views: Vec<_> = parts.iter().map(|p| p.view()).collect();
        ndarray::concatenate(Axis(0), &views)?
    };

    if output.nrows() != texts.len() {
        return Err(ModelError::Inference(format!(
            "model returned {} rows for {} texts",
            output.nrows(),
            texts.len()
        )));
    }
    Ok(output)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return s.to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "unknown panic".to_string()
}

/// Cloneable submitter for the inference worker.
#[derive(Clone)]
pub struct InferenceHandle {
    sender: mpsc::Sender<InferenceJob>,
    info: Arc<ModelInfo>,
}

impl InferenceHandle {
    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    /// Jobs waiting in the queue, not counting the one in flight.
    pub fn queued(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    /// Queues `texts` and waits for the embedding matrix.
    pub async fn submit(&self, texts: Vec<String>, batch_size: usize) -> Result<InferenceOutput, EngineError> {
        let (result_sender, result_receiver) = oneshot::channel();
        let job = InferenceJob {
            texts,
            batch_size,
            result_sender,
        };

        self.sender
            .send(job)
            .await
            .map_err(|_| EngineError::WorkerUnavailable)?;

        result_receiver
            .await
            .map_err(|_| EngineError::WorkerUnavailable)?
    }
}
