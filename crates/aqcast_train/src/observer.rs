//! Per-epoch observers.
//!
//! The training loop calls [`EpochObserver::on_epoch_end`] once per epoch
//! with the epoch's losses. Returning an error aborts the run.

use crate::error::Result;

/// Losses reported at the end of an epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    /// Epoch index (0-based).
    pub epoch: usize,
    /// Total number of epochs.
    pub n_epochs: usize,
    /// Size-weighted mean training loss.
    pub train_loss: f32,
    /// Loss on the held-out windows.
    pub valid_loss: f32,
}

/// Receives a report after every epoch.
pub trait EpochObserver {
    /// Called once per epoch, after validation.
    fn on_epoch_end(&mut self, report: &EpochReport) -> Result<()>;

    /// Called once after the last epoch.
    fn on_fit_end(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<F> EpochObserver for F
where
    F: FnMut(&EpochReport),
{
    fn on_epoch_end(&mut self, report: &EpochReport) -> Result<()> {
        self(report);
        Ok(())
    }
}

/// Logs every epoch through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct ProgressObserver;

impl ProgressObserver {
    /// Create a new progress observer.
    pub fn new() -> Self {
        Self
    }
}

impl EpochObserver for ProgressObserver {
    fn on_epoch_end(&mut self, report: &EpochReport) -> Result<()> {
        tracing::info!(
            "Epoch {}/{}: train_loss={:.6}, valid_loss={:.6}",
            report.epoch + 1,
            report.n_epochs,
            report.train_loss,
            report.valid_loss
        );
        Ok(())
    }

    fn on_fit_end(&mut self) -> Result<()> {
        tracing::info!("Training completed");
        Ok(())
    }
}

/// Records every epoch's losses.
#[derive(Debug, Clone, Default)]
pub struct HistoryObserver {
    train_losses: Vec<f32>,
    valid_losses: Vec<f32>,
}

impl HistoryObserver {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Training loss per epoch.
    pub fn train_losses(&self) -> &[f32] {
        &self.train_losses
    }

    /// Validation loss per epoch.
    pub fn valid_losses(&self) -> &[f32] {
        &self.valid_losses
    }

    /// Epoch with the lowest validation loss.
    pub fn best_epoch(&self) -> Option<usize> {
        self.valid_losses
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(epoch, _)| epoch)
    }
}

impl EpochObserver for HistoryObserver {
    fn on_epoch_end(&mut self, report: &EpochReport) -> Result<()> {
        self.train_losses.push(report.train_loss);
        self.valid_losses.push(report.valid_loss);
        Ok(())
    }
}

/// Several observers called in order.
#[derive(Default)]
pub struct ObserverList<'a> {
    observers: Vec<&'a mut dyn EpochObserver>,
}

impl<'a> ObserverList<'a> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Append an observer.
    #[must_use]
    pub fn with(mut self, observer: &'a mut dyn EpochObserver) -> Self {
        self.observers.push(observer);
        self
    }
}

impl EpochObserver for ObserverList<'_> {
    fn on_epoch_end(&mut self, report: &EpochReport) -> Result<()> {
        for observer in &mut self.observers {
            observer.on_epoch_end(report)?;
        }
        Ok(())
    }

    fn on_fit_end(&mut self) -> Result<()> {
        for observer in &mut self.observers {
            observer.on_fit_end()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(epoch: usize, valid_loss: f32) -> EpochReport {
        EpochReport {
            epoch,
            n_epochs: 3,
            train_loss: 1.0,
            valid_loss,
        }
    }

    #[test]
    fn test_history_observer() {
        let mut history = HistoryObserver::new();
        for (epoch, loss) in [0.5, 0.2, 0.3].into_iter().enumerate() {
            history.on_epoch_end(&report(epoch, loss)).unwrap();
        }
        assert_eq!(history.valid_losses(), &[0.5, 0.2, 0.3]);
        assert_eq!(history.train_losses().len(), 3);
        assert_eq!(history.best_epoch(), Some(1));
    }

    #[test]
    fn test_closure_observer() {
        let mut seen = Vec::new();
        {
            let mut observer = |r: &EpochReport| seen.push(r.epoch);
            observer.on_epoch_end(&report(0, 0.1)).unwrap();
            observer.on_epoch_end(&report(1, 0.1)).unwrap();
        }
        assert_eq!(seen, vec![0, 1]);
    }

    #[test]
    fn test_observer_list() {
        let mut a = HistoryObserver::new();
        let mut b = HistoryObserver::new();
        {
            let mut list = ObserverList::new().with(&mut a).with(&mut b);
            list.on_epoch_end(&report(0, 0.4)).unwrap();
            list.on_fit_end().unwrap();
        }
        assert_eq!(a.valid_losses(), &[0.4]);
        assert_eq!(b.valid_losses(), &[0.4]);
    }
}
