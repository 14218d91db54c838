
use itertools::Itertools;
use tracing::{ debug, error, trace };

use crate::branch::*;
use crate::config::*;
use crate::error::PredictorError;
use crate::history::*;
use crate::predictor::*;

/// Add some value to a weight, saturating at [WEIGHT_MIN] and [WEIGHT_MAX].
fn saturating_step(weight: i8, delta: i32) -> i8 {
    (weight as i32 + delta).clamp(WEIGHT_MIN as i32, WEIGHT_MAX as i32) as i8
}

/// Compute the output of a single perceptron.
///
/// The bias weight is multiplied by a constant input of +1. Each remaining
/// weight 'i+1' is added when bit 'i' of global history is set (taken), and
/// subtracted otherwise.
pub fn perceptron_output(weights: &[i8], ghr: &GlobalHistoryRegister) -> i32 {
    assert!(weights.len() == ROW_LEN);
    let history = ghr.bits()[..HIST_LEN].iter().by_vals();
    weights[1..].iter().zip_eq(history)
        .fold(weights[0] as i32, |sum, (w, taken)| {
            if taken { sum + *w as i32 } else { sum - *w as i32 }
        })
}

/// Move the weights of a single perceptron toward some outcome.
///
/// The bias weight moves in the direction of the outcome. Every other weight
/// is incremented when the corresponding history bit agrees with the outcome
/// and decremented when it disagrees.
pub fn perceptron_train(weights: &mut [i8], ghr: &GlobalHistoryRegister,
    outcome: Outcome)
{
    assert!(weights.len() == ROW_LEN);
    weights[0] = saturating_step(weights[0], outcome.to_signed());

    let history = ghr.bits()[..HIST_LEN].iter().by_vals().map(Outcome::from);
    for (w, bit) in weights[1..].iter_mut().zip_eq(history) {
        let adj = if bit == outcome { 1 } else { -1 };
        *w = saturating_step(*w, adj);
    }
}

/// The result of a lookup in [PerceptronPredictor].
///
/// This carries everything needed to train the predictor once the branch
/// has been resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PerceptronPrediction {
    /// Program counter of the predicted branch
    pub pc: u32,

    /// The row used in each table
    pub idx: [usize; NUM_TABLES],

    /// The output of the perceptron read from each table
    pub sums: [i32; NUM_TABLES],

    /// The predicted direction
    pub outcome: Outcome,
}
impl PerceptronPrediction {
    /// The combined output of all tables.
    pub fn output(&self) -> i32 {
        self.sums.iter().sum()
    }

    /// The magnitude of the combined output.
    pub fn magnitude(&self) -> i32 {
        self.output().abs()
    }
}

/// A perceptron predictor with two tables.
///
/// The first table is indexed with a folded hash of the program counter, and
/// the second is indexed with the program counter XOR'ed with global history.
/// The outputs of both perceptrons are added together, and the branch is
/// predicted taken when the sum is non-negative.
///
/// Training occurs after a misprediction, or when the magnitude of the sum
/// is at most some threshold. The threshold itself adapts over time (see
/// [ThresholdCounter]).
///
/// The predictor can be driven in two ways:
///
/// - With [ConditionalBranchPredictor::predict] followed by
///   [ConditionalBranchPredictor::update]. The output of the prediction is
///   held inside the predictor until the matching update.
/// - With [PerceptronPredictor::lookup] followed by
///   [PerceptronPredictor::train], where the caller holds on to the
///   [PerceptronPrediction].
///
/// These should not be mixed for the same branch.
///
/// See the following papers:
///
/// - "Dynamic Branch Prediction with Perceptrons" (Jiménez and Lin, 2001)
/// - "Neural Methods for Dynamic Branch Prediction" (Jiménez and Lin, 2002)
///
#[derive(Clone, Debug)]
pub struct PerceptronPredictor {
    /// Tables of perceptrons
    tables: [PerceptronTable; NUM_TABLES],

    /// Global history of resolved branch outcomes
    ghr: GlobalHistoryRegister,

    /// Adaptive training threshold
    threshold: ThresholdCounter,

    /// A prediction waiting for the matching update
    pending: Option<PerceptronPrediction>,
}
impl PerceptronPredictor {
    pub fn new() -> Self {
        Self {
            tables: [
                PerceptronTable::new(IndexStrategy::FromPc(folded_pc_index)),
                PerceptronTable::new(IndexStrategy::FromGhr(pc_xor_ghr_index)),
            ],
            ghr: GlobalHistoryRegister::new(),
            threshold: ThresholdCounter::new(),
            pending: None,
        }
    }

    /// Return the current state of global history.
    pub fn ghr(&self) -> &GlobalHistoryRegister { &self.ghr }

    /// Return the current training threshold.
    pub fn threshold(&self) -> i32 { self.threshold.threshold() }

    /// Return the current value of the counter used to adjust the threshold.
    pub fn threshold_counter(&self) -> i32 { self.threshold.counter() }

    /// Return the prediction waiting for an update (if any).
    pub fn pending(&self) -> Option<&PerceptronPrediction> {
        self.pending.as_ref()
    }

    /// Return the per-table outputs held for the pending update.
    /// These are zero when no prediction is pending.
    pub fn transient_sums(&self) -> [i32; NUM_TABLES] {
        self.pending.map(|p| p.sums).unwrap_or([0; NUM_TABLES])
    }

    /// Return a reference to one of the tables.
    pub fn table(&self, k: usize) -> &PerceptronTable { &self.tables[k] }

    /// Return the weights in some row of one of the tables.
    pub fn row(&self, k: usize, idx: usize) -> &[i8] {
        self.tables[k].get_entry(idx)
    }

    /// Return the row selected in each table for some program counter,
    /// given the current state of global history.
    pub fn indices(&self, pc: u32) -> [usize; NUM_TABLES] {
        let input = PerceptronInputs { pc, ghr: &self.ghr };
        std::array::from_fn(|k| self.tables[k].get_index(input))
    }

    /// Make a prediction for the branch at 'pc' without changing any state.
    pub fn lookup(&self, pc: u32) -> PerceptronPrediction {
        let idx = self.indices(pc);
        let sums = std::array::from_fn(|k| {
            perceptron_output(self.tables[k].get_entry(idx[k]), &self.ghr)
        });
        let mut res = PerceptronPrediction {
            pc, idx, sums, outcome: Outcome::N,
        };
        res.outcome = Outcome::from(res.output() >= 0);
        res
    }

    /// Given a prediction and the resolved outcome, update the state of the
    /// predictor.
    ///
    /// The rows are selected again with the current state of global history
    /// (which has not yet been advanced for this branch), but the outputs
    /// are taken from the prediction rather than recomputed.
    pub fn train(&mut self, pc: u32, prediction: PerceptronPrediction,
        outcome: Outcome)
    {
        debug_assert_eq!(prediction.pc, pc,
            "training branch {:#010x} with a prediction for {:#010x}",
            pc, prediction.pc);
        let idx = self.indices(pc);
        let magnitude = prediction.magnitude();
        let miss = prediction.outcome != outcome;

        if miss || self.threshold.is_low_confidence(magnitude) {
            for (table, idx) in self.tables.iter_mut().zip(idx) {
                perceptron_train(table.get_entry_mut(idx), &self.ghr, outcome);
            }
        }
        trace!(pc, ?idx, output = prediction.output(), ?outcome, miss,
            "trained");

        self.ghr.push(outcome);

        if let Some(change) = self.threshold.update(!miss, magnitude) {
            debug!(?change, "training threshold moved");
        }
    }

    /// Make a prediction for the branch at 'pc', holding on to the result
    /// until the matching call to [PerceptronPredictor::try_update].
    pub fn try_predict(&mut self, pc: u32) -> Result<bool, PredictorError> {
        if let Some(pending) = self.pending {
            return Err(PredictorError::PredictWhilePending {
                pending_pc: pending.pc, pc,
            });
        }
        let prediction = self.lookup(pc);
        trace!(pc, idx = ?prediction.idx, sums = ?prediction.sums,
            outcome = ?prediction.outcome, "predicted");
        self.pending = Some(prediction);
        Ok(prediction.outcome.into())
    }

    /// Update the predictor with the resolved direction of the branch at
    /// 'pc', consuming the result of the previous call to
    /// [PerceptronPredictor::try_predict].
    ///
    /// 'predicted' is the direction the caller acted on, and decides whether
    /// this branch counts as a misprediction.
    pub fn try_update(&mut self, pc: u32, resolved: bool, predicted: bool)
        -> Result<(), PredictorError>
    {
        let pending = self.pending
            .ok_or(PredictorError::UpdateWithoutPredict { pc })?;
        if pending.pc != pc {
            return Err(PredictorError::MismatchedUpdate {
                predicted_pc: pending.pc, pc,
            });
        }
        self.pending = None;
        let prediction = PerceptronPrediction {
            outcome: Outcome::from(predicted),
            ..pending
        };
        self.train(pc, prediction, Outcome::from(resolved));
        Ok(())
    }
}

impl Default for PerceptronPredictor {
    fn default() -> Self { Self::new() }
}

impl ConditionalBranchPredictor for PerceptronPredictor {
    fn name(&self) -> &'static str { "PerceptronPredictor" }

    /// # Panics
    ///
    /// Panics if the previous prediction has not been updated.
    fn predict(&mut self, pc: u32) -> bool {
        match self.try_predict(pc) {
            Ok(taken) => taken,
            Err(e) => {
                error!("{}", e);
                panic!("{}", e);
            },
        }
    }

    /// # Panics
    ///
    /// Panics if there is no pending prediction for 'pc'.
    fn update(&mut self, pc: u32, resolved: bool, predicted: bool,
        _target: u32)
    {
        if let Err(e) = self.try_update(pc, resolved, predicted) {
            error!("{}", e);
            panic!("{}", e);
        }
    }

    fn reset(&mut self) {
        for table in self.tables.iter_mut() {
            table.reset();
        }
        self.ghr.reset();
        self.threshold.reset();
        self.pending = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn output_uses_signed_history() {
        let mut weights = [0i8; ROW_LEN];
        weights[0] = 3;
        weights[1] = 5;
        weights[2] = 7;
        // Bit 0 is taken, bit 1 is not-taken
        let ghr = GlobalHistoryRegister::from_raw(0b01);
        assert_eq!(perceptron_output(&weights, &ghr), 3 + 5 - 7);
    }

    #[test]
    fn train_moves_toward_agreement() {
        let mut weights = [0i8; ROW_LEN];
        let ghr = GlobalHistoryRegister::from_raw(0b01);
        perceptron_train(&mut weights, &ghr, Outcome::T);
        assert_eq!(weights[0], 1);
        assert_eq!(weights[1], 1);
        assert!(weights[2..].iter().all(|w| *w == -1));

        perceptron_train(&mut weights, &ghr, Outcome::N);
        assert!(weights.iter().all(|w| *w == 0));
    }

    #[test]
    fn train_saturates() {
        let mut weights = [WEIGHT_MAX; ROW_LEN];
        let ghr = GlobalHistoryRegister::new();
        perceptron_train(&mut weights, &ghr, Outcome::T);
        assert!(weights.iter().all(|w| *w == WEIGHT_MAX));

        let mut weights = [WEIGHT_MIN; ROW_LEN];
        perceptron_train(&mut weights, &ghr, Outcome::N);
        assert!(weights.iter().all(|w| *w == WEIGHT_MIN));
    }

    #[test]
    fn empty_predictor_predicts_taken() {
        let p = PerceptronPredictor::new();
        let res = p.lookup(0x1000);
        assert_eq!(res.sums, [0, 0]);
        assert_eq!(res.outcome, Outcome::T);
        assert_eq!(res.idx, [8, 0x1ff]);
    }

    #[test]
    fn first_update() {
        let mut p = PerceptronPredictor::new();
        assert!(p.predict(0x1000));
        p.update(0x1000, true, true, 0);

        assert_eq!(p.ghr().value() & 1, 1);
        assert_eq!(p.row(0, 8)[0], 1);
        assert_eq!(p.row(1, 0x1ff)[0], 1);
        // History was all-ones, so every weight agreed with 'taken'
        assert!(p.row(0, 8).iter().all(|w| *w == 1));
        assert!(p.row(1, 0x1ff).iter().all(|w| *w == 1));
        assert_eq!(p.transient_sums(), [0, 0]);
        assert!(p.pending().is_none());
    }

    #[test]
    fn confident_hits_skip_training() {
        let mut p = PerceptronPredictor::new();
        for _ in 0..4 {
            let t = p.predict(0x40);
            p.update(0x40, true, t, 0);
        }
        // Two trainings (output 0 then 64) before the output clears the
        // threshold (128 > 74).
        assert!(p.row(0, 0x40).iter().all(|w| *w == 2));
        assert_eq!(p.lookup(0x40).output(), 128);
    }

    #[test]
    fn update_reuses_predicted_sums() {
        let mut a = PerceptronPredictor::new();
        let mut b = PerceptronPredictor::new();
        for pc in [0x10u32, 0x24, 0x10, 0x38, 0x10] {
            let p = a.lookup(pc);
            a.train(pc, p, Outcome::N);
            let t = b.predict(pc);
            b.update(pc, false, t, 0);
        }
        assert_eq!(a.ghr(), b.ghr());
        assert_eq!(a.table(0).weights(), b.table(0).weights());
        assert_eq!(a.table(1).weights(), b.table(1).weights());
        assert_eq!(a.threshold_counter(), b.threshold_counter());
    }

    #[test]
    fn protocol_violations() {
        let mut p = PerceptronPredictor::new();
        assert_eq!(p.try_update(0x10, true, true),
            Err(PredictorError::UpdateWithoutPredict { pc: 0x10 }));
        assert_eq!(p.try_predict(0x10), Ok(true));
        assert_eq!(p.try_predict(0x20),
            Err(PredictorError::PredictWhilePending {
                pending_pc: 0x10, pc: 0x20
            }));
        assert_eq!(p.try_update(0x20, true, true),
            Err(PredictorError::MismatchedUpdate {
                predicted_pc: 0x10, pc: 0x20
            }));
        // The pending prediction survives a rejected update
        assert_eq!(p.try_update(0x10, true, true), Ok(()));
    }

    #[test]
    #[should_panic]
    fn double_predict_panics() {
        let mut p = PerceptronPredictor::new();
        p.predict(0x10);
        p.predict(0x10);
    }

    #[test]
    #[should_panic]
    fn update_without_predict_panics() {
        let mut p = PerceptronPredictor::new();
        p.update(0x10, true, true, 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn train_rejects_prediction_for_another_branch() {
        let mut p = PerceptronPredictor::new();
        let prediction = p.lookup(0x10);
        p.train(0x20, prediction, Outcome::T);
    }

    #[test]
    fn track_other_inst_is_inert() {
        let mut p = PerceptronPredictor::new();
        let before = p.clone();
        p.track_other_inst(0x10, OpKind::DirectCall, 0x80);
        p.track_other_inst(0x14, OpKind::Load, 0);
        assert_eq!(p.ghr(), before.ghr());
        assert_eq!(p.table(0).weights(), before.table(0).weights());
        assert_eq!(p.threshold(), before.threshold());
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut p = PerceptronPredictor::new();
        for pc in 0..64u32 {
            let t = p.predict(pc);
            p.update(pc, pc % 3 == 0, t, 0);
        }
        p.predict(0x99);
        p.reset();
        assert_eq!(p.ghr().value(), GlobalHistoryRegister::INIT);
        assert_eq!(p.threshold(), INITIAL_THRESHOLD);
        assert_eq!(p.threshold_counter(), 0);
        assert!(p.pending().is_none());
        assert!(p.table(0).weights().iter().all(|w| *w == 0));
        assert!(p.table(1).weights().iter().all(|w| *w == 0));
    }
}
