//! Snapshot and increment containers.
//!
//! A [`CurveSnapshot`] is the immutable result of one curve evolution step:
//! the rate curve view valid from the end of the step, plus the fitted level
//! and increment curves keyed by `(label, quantity)`. Each snapshot keeps an
//! `Arc` to the one it was evolved from, so a path can be walked backwards
//! with [`CurveSnapshot::history`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bgm_core::{CurveLabel, Date, EvolutionLabels};
use bgm_curves::curves::FittedCurve;
use bgm_curves::RateCurve;
use serde::{Deserialize, Serialize};

use crate::error::{DynamicsError, DynamicsResult};
use crate::snapshot::TimePointSnapshot;
use crate::volatility::VolatilityModel;

/// Quantities tracked per curve label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quantity {
    /// Tenor LIBOR fixing.
    Libor,
    /// Step increment of the LIBOR fixing.
    LiborIncrement,
    /// Discount factor.
    DiscountFactor,
    /// Step increment of the discount factor.
    DiscountFactorIncrement,
    /// Instantaneous continuously-compounded forward.
    ContinuousForward,
    /// Step increment of the continuous forward.
    ContinuousForwardIncrement,
    /// Continuously-compounded spot rate.
    SpotRate,
    /// Step increment of the spot rate.
    SpotRateIncrement,
}

impl Quantity {
    /// Level quantities, refitted into the evolved curve.
    pub const LEVELS: [Quantity; 4] = [
        Quantity::Libor,
        Quantity::DiscountFactor,
        Quantity::ContinuousForward,
        Quantity::SpotRate,
    ];

    /// Increment quantities, refitted into the step's spans.
    pub const INCREMENTS: [Quantity; 4] = [
        Quantity::LiborIncrement,
        Quantity::DiscountFactorIncrement,
        Quantity::ContinuousForwardIncrement,
        Quantity::SpotRateIncrement,
    ];

    /// Snake-case name.
    pub fn name(self) -> &'static str {
        match self {
            Quantity::Libor => "libor",
            Quantity::LiborIncrement => "libor_increment",
            Quantity::DiscountFactor => "discount_factor",
            Quantity::DiscountFactorIncrement => "discount_factor_increment",
            Quantity::ContinuousForward => "continuous_forward",
            Quantity::ContinuousForwardIncrement => "continuous_forward_increment",
            Quantity::SpotRate => "spot_rate",
            Quantity::SpotRateIncrement => "spot_rate_increment",
        }
    }

    /// True for the increment quantities.
    pub fn is_increment(self) -> bool {
        Self::INCREMENTS.contains(&self)
    }

    /// Increment paired with a level, or the increment itself.
    pub fn increment(self) -> Quantity {
        match self {
            Quantity::Libor | Quantity::LiborIncrement => Quantity::LiborIncrement,
            Quantity::DiscountFactor | Quantity::DiscountFactorIncrement => {
                Quantity::DiscountFactorIncrement
            }
            Quantity::ContinuousForward | Quantity::ContinuousForwardIncrement => {
                Quantity::ContinuousForwardIncrement
            }
            Quantity::SpotRate | Quantity::SpotRateIncrement => Quantity::SpotRateIncrement,
        }
    }

    /// Label a quantity of an evolving curve pair is keyed under: discounting
    /// quantities belong to the funding curve, the rest to the forward curve.
    pub fn owner(self, labels: &EvolutionLabels) -> &CurveLabel {
        match self.increment() {
            Quantity::DiscountFactorIncrement | Quantity::SpotRateIncrement => &labels.funding,
            _ => &labels.forward,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// KEYED RECORD
// =============================================================================

/// Values keyed by curve label and quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedRecord<V> {
    entries: BTreeMap<(CurveLabel, Quantity), V>,
}

impl<V> Default for KeyedRecord<V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<V> KeyedRecord<V> {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value`, returning the value it replaces.
    pub fn insert(&mut self, label: CurveLabel, quantity: Quantity, value: V) -> Option<V> {
        self.entries.insert((label, quantity), value)
    }

    /// Looks up an entry.
    ///
    /// # Errors
    ///
    /// Fails with [`DynamicsError::MissingQuantity`] if the entry was never populated.
    pub fn get(&self, label: &CurveLabel, quantity: Quantity) -> DynamicsResult<&V> {
        self.entries
            .get(&(label.clone(), quantity))
            .ok_or_else(|| DynamicsError::MissingQuantity {
                label: label.clone(),
                quantity,
            })
    }

    /// True if the entry was populated.
    pub fn contains(&self, label: &CurveLabel, quantity: Quantity) -> bool {
        self.entries.contains_key(&(label.clone(), quantity))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in `(label, quantity)` order.
    pub fn iter(&self) -> impl Iterator<Item = (&CurveLabel, Quantity, &V)> {
        self.entries
            .iter()
            .map(|((label, quantity), value)| (label, *quantity, value))
    }
}

// =============================================================================
// INTERVAL
// =============================================================================

/// Closed date interval covered by one evolution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvolutionInterval {
    start: Date,
    end: Date,
}

impl EvolutionInterval {
    /// Creates `[start, end]`.
    pub fn new(start: Date, end: Date) -> DynamicsResult<Self> {
        if end < start {
            return Err(DynamicsError::invalid_input(format!(
                "interval end {end} is before start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Zero-length interval at `date`.
    pub fn instant(date: Date) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Start date.
    pub fn start(&self) -> Date {
        self.start
    }

    /// End date.
    pub fn end(&self) -> Date {
        self.end
    }

    /// Length in calendar days.
    pub fn days(&self) -> i64 {
        self.end - self.start
    }
}

impl fmt::Display for EvolutionInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

// =============================================================================
// SNAPSHOTS
// =============================================================================

/// The curve state at the end of an evolution step.
#[derive(Debug, Clone)]
pub struct CurveSnapshot {
    interval: EvolutionInterval,
    labels: EvolutionLabels,
    curve: Arc<dyn RateCurve>,
    levels: KeyedRecord<Arc<FittedCurve>>,
    spans: KeyedRecord<Arc<FittedCurve>>,
    model: Arc<VolatilityModel>,
    previous: Option<Arc<CurveSnapshot>>,
}

impl CurveSnapshot {
    /// Starting state of a path: the given curve, an empty interval at its
    /// reference date and no fitted records.
    pub fn initial(
        labels: EvolutionLabels,
        curve: Arc<dyn RateCurve>,
        model: Arc<VolatilityModel>,
    ) -> Self {
        Self {
            interval: EvolutionInterval::instant(curve.reference_date()),
            labels,
            curve,
            levels: KeyedRecord::new(),
            spans: KeyedRecord::new(),
            model,
            previous: None,
        }
    }

    pub(crate) fn evolved(
        interval: EvolutionInterval,
        curve: Arc<dyn RateCurve>,
        levels: KeyedRecord<Arc<FittedCurve>>,
        spans: KeyedRecord<Arc<FittedCurve>>,
        previous: &Arc<CurveSnapshot>,
    ) -> Self {
        Self {
            interval,
            labels: previous.labels.clone(),
            curve,
            levels,
            spans,
            model: Arc::clone(&previous.model),
            previous: Some(Arc::clone(previous)),
        }
    }

    /// Step covered by this snapshot.
    pub fn interval(&self) -> EvolutionInterval {
        self.interval
    }

    /// Curve pair.
    pub fn labels(&self) -> &EvolutionLabels {
        &self.labels
    }

    /// Rate curve valid from the end of the interval.
    pub fn curve(&self) -> &Arc<dyn RateCurve> {
        &self.curve
    }

    /// Shared volatility model.
    pub fn model(&self) -> &Arc<VolatilityModel> {
        &self.model
    }

    /// Snapshot this one was evolved from.
    pub fn previous(&self) -> Option<&Arc<CurveSnapshot>> {
        self.previous.as_ref()
    }

    /// Fitted level curve.
    pub fn level(&self, label: &CurveLabel, quantity: Quantity) -> DynamicsResult<&Arc<FittedCurve>> {
        self.levels.get(label, quantity)
    }

    /// Fitted increment curve.
    pub fn span(&self, label: &CurveLabel, quantity: Quantity) -> DynamicsResult<&Arc<FittedCurve>> {
        self.spans.get(label, quantity)
    }

    /// Every fitted level curve.
    pub fn levels(&self) -> &KeyedRecord<Arc<FittedCurve>> {
        &self.levels
    }

    /// The step's increments.
    pub fn increment(&self) -> CurveIncrement {
        CurveIncrement {
            interval: self.interval,
            labels: self.labels.clone(),
            spans: self.spans.clone(),
        }
    }

    /// This snapshot followed by its ancestors, newest first.
    pub fn history(&self) -> impl Iterator<Item = &CurveSnapshot> {
        std::iter::successors(Some(self), |snapshot| snapshot.previous.as_deref())
    }
}

/// Increment view of one step: the interval and the fitted spans.
#[derive(Debug, Clone)]
pub struct CurveIncrement {
    interval: EvolutionInterval,
    labels: EvolutionLabels,
    spans: KeyedRecord<Arc<FittedCurve>>,
}

impl CurveIncrement {
    /// Step covered.
    pub fn interval(&self) -> EvolutionInterval {
        self.interval
    }

    /// Curve pair.
    pub fn labels(&self) -> &EvolutionLabels {
        &self.labels
    }

    /// Fitted increment curve.
    pub fn span(&self, label: &CurveLabel, quantity: Quantity) -> DynamicsResult<&Arc<FittedCurve>> {
        self.spans.get(label, quantity)
    }

    /// Every fitted increment curve.
    pub fn spans(&self) -> &KeyedRecord<Arc<FittedCurve>> {
        &self.spans
    }
}

/// State of a single-point evolver.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSnapshot {
    interval: EvolutionInterval,
    labels: EvolutionLabels,
    point: TimePointSnapshot,
}

impl PointSnapshot {
    /// Creates a point state.
    pub fn new(interval: EvolutionInterval, labels: EvolutionLabels, point: TimePointSnapshot) -> Self {
        Self {
            interval,
            labels,
            point,
        }
    }

    /// Step covered.
    pub fn interval(&self) -> EvolutionInterval {
        self.interval
    }

    /// Curve pair.
    pub fn labels(&self) -> &EvolutionLabels {
        &self.labels
    }

    /// The evolved point.
    pub fn point(&self) -> &TimePointSnapshot {
        &self.point
    }
}

/// Previous state accepted by every evolver.
#[derive(Debug, Clone)]
pub enum EvolutionState {
    /// Full refitted curve.
    Curve(Arc<CurveSnapshot>),
    /// Single evolved rate.
    Point(PointSnapshot),
}

impl EvolutionState {
    /// Variant name, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            EvolutionState::Curve(_) => CURVE_STATE,
            EvolutionState::Point(_) => POINT_STATE,
        }
    }

    /// Curve pair of the state.
    pub fn labels(&self) -> &EvolutionLabels {
        match self {
            EvolutionState::Curve(snapshot) => snapshot.labels(),
            EvolutionState::Point(point) => point.labels(),
        }
    }

    /// Step covered by the state.
    pub fn interval(&self) -> EvolutionInterval {
        match self {
            EvolutionState::Curve(snapshot) => snapshot.interval(),
            EvolutionState::Point(point) => point.interval(),
        }
    }

    /// The curve snapshot, if any.
    pub fn as_curve(&self) -> Option<&Arc<CurveSnapshot>> {
        match self {
            EvolutionState::Curve(snapshot) => Some(snapshot),
            EvolutionState::Point(_) => None,
        }
    }

    /// The point snapshot, if any.
    pub fn as_point(&self) -> Option<&PointSnapshot> {
        match self {
            EvolutionState::Point(point) => Some(point),
            EvolutionState::Curve(_) => None,
        }
    }

    /// The curve snapshot, or a [`DynamicsError::SnapshotMismatch`].
    pub fn expect_curve(&self) -> DynamicsResult<&Arc<CurveSnapshot>> {
        self.as_curve()
            .ok_or_else(|| DynamicsError::snapshot_mismatch(CURVE_STATE, self.kind()))
    }

    /// The point snapshot, or a [`DynamicsError::SnapshotMismatch`].
    pub fn expect_point(&self) -> DynamicsResult<&PointSnapshot> {
        self.as_point()
            .ok_or_else(|| DynamicsError::snapshot_mismatch(POINT_STATE, self.kind()))
    }
}

impl From<CurveSnapshot> for EvolutionState {
    fn from(snapshot: CurveSnapshot) -> Self {
        EvolutionState::Curve(Arc::new(snapshot))
    }
}

impl From<PointSnapshot> for EvolutionState {
    fn from(point: PointSnapshot) -> Self {
        EvolutionState::Point(point)
    }
}

const CURVE_STATE: &str = "curve";
const POINT_STATE: &str = "point";

#[cfg(test)]
mod tests {
    use super::*;
    use bgm_core::Tenor;
    use bgm_curves::curves::FlatRateCurve;
    use crate::volatility::FlatVolatilitySurface;

    fn labels() -> EvolutionLabels {
        EvolutionLabels::new(
            CurveLabel::parse("USD.SOFR").unwrap(),
            CurveLabel::parse("USD.LIBOR3M").unwrap(),
        )
    }

    fn initial() -> CurveSnapshot {
        let spot = Date::from_ymd(2025, 1, 2).unwrap();
        let model = VolatilityModel::builder(spot, labels().forward)
            .tenor(Tenor::months(3).unwrap())
            .factor(FlatVolatilitySurface::new(0.1).unwrap())
            .build()
            .unwrap();
        CurveSnapshot::initial(labels(), Arc::new(FlatRateCurve::new(spot, 0.03)), Arc::new(model))
    }

    #[test]
    fn test_quantity_pairs_and_owners() {
        assert_eq!(Quantity::Libor.increment(), Quantity::LiborIncrement);
        assert!(Quantity::SpotRateIncrement.is_increment());
        assert!(!Quantity::DiscountFactor.is_increment());
        let labels = labels();
        assert_eq!(Quantity::DiscountFactor.owner(&labels), &labels.funding);
        assert_eq!(Quantity::SpotRateIncrement.owner(&labels), &labels.funding);
        assert_eq!(Quantity::ContinuousForward.owner(&labels), &labels.forward);
    }

    #[test]
    fn test_keyed_record_missing_quantity() {
        let mut record = KeyedRecord::new();
        let label = labels().forward;
        record.insert(label.clone(), Quantity::Libor, 1.5);
        assert_eq!(*record.get(&label, Quantity::Libor).unwrap(), 1.5);
        assert!(record.contains(&label, Quantity::Libor));
        assert_eq!(
            record.get(&label, Quantity::SpotRate).unwrap_err(),
            DynamicsError::MissingQuantity {
                label: label.clone(),
                quantity: Quantity::SpotRate,
            }
        );
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_interval() {
        let start = Date::from_ymd(2025, 1, 2).unwrap();
        let interval = EvolutionInterval::new(start, start.add_days(91)).unwrap();
        assert_eq!(interval.days(), 91);
        assert!(EvolutionInterval::new(start, start.add_days(-1)).is_err());
        assert_eq!(interval.to_string(), "[2025-01-02, 2025-04-03]");
    }

    #[test]
    fn test_initial_snapshot() {
        let snapshot = initial();
        assert_eq!(snapshot.interval().days(), 0);
        assert!(snapshot.previous().is_none());
        assert_eq!(snapshot.history().count(), 1);
        assert!(snapshot.level(&labels().forward, Quantity::Libor).is_err());
        assert!(snapshot.increment().spans().is_empty());
    }

    #[test]
    fn test_state_variant_checks() {
        let state = EvolutionState::from(initial());
        assert_eq!(state.kind(), "curve");
        assert!(state.expect_curve().is_ok());
        assert_eq!(
            state.expect_point().unwrap_err(),
            DynamicsError::snapshot_mismatch("point", "curve")
        );
    }
}
