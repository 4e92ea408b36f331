//! Share of the supplied query the match honours

use crate::inference::{Evidence, EvidenceValue};
use crate::model::{Classification, Classifier};
use crate::network::Schema;

/// Fraction of the query's supplied fields that agree with the matched record
///
/// `original` is the normalised query before relaxation. Fields relaxed away
/// count against the match; fields the record lacks are not counted. Derived
/// fields are skipped. With nothing to compare the fidelity is 1.
pub fn fidelity(
    schema: &Schema,
    original: &Classification,
    relaxed: &Classification,
    matched: &dyn Classifier,
) -> f64 {
    let evidence = Evidence::compute(schema, original, matched);
    let mut supplied = 0usize;
    let mut honoured = 0usize;

    for observable in schema.iter().skip(1).filter(|o| !o.derived) {
        if !original.has(observable.id) {
            continue;
        }
        if !relaxed.has(observable.id) {
            supplied += 1;
            continue;
        }
        let value = evidence.get(observable.id);
        if value.is_known() {
            supplied += 1;
            if value == EvidenceValue::Matches {
                honoured += 1;
            }
        }
    }

    if supplied == 0 {
        1.0
    } else {
        honoured as f64 / supplied as f64
    }
}
