//! Reference arithmetic used during evaluation
//!
//! Combining references (`:` and intersection) and turning a reference into
//! the concrete rectangle of cells that will be read.

use crate::config::{EvaluationConfig, FullReferencePolicy};
use crate::store::CellStore;
use gridcalc_core::{
    ColumnSpan, ErrorKind, RangeReference, Reference, RowSpan, MAX_COLUMNS, MAX_ROWS,
};
use tracing::debug;

/// Smallest reference covering both operands of a dynamic `:`
pub(crate) fn bounding(start: &Reference, end: &Reference) -> Result<Reference, ErrorKind> {
    if start.sheet() != end.sheet() {
        return Err(ErrorKind::Ref);
    }

    let combined = match (start, end) {
        (Reference::Columns(a), Reference::Columns(b)) => ColumnSpan::new(
            a.sheet().clone(),
            a.start().min(b.start()),
            a.end().max(b.end()),
        )
        .map(Reference::Columns),
        (Reference::Rows(a), Reference::Rows(b)) => RowSpan::new(
            a.sheet().clone(),
            a.start().min(b.start()),
            a.end().max(b.end()),
        )
        .map(Reference::Rows),
        _ => start
            .to_range()
            .bounding(&end.to_range())
            .map(Reference::from_range),
    };
    combined.map_err(|_| ErrorKind::Ref)
}

/// Cells common to both references; `#NULL!` when they do not overlap
pub(crate) fn intersect(left: &Reference, right: &Reference) -> Result<Reference, ErrorKind> {
    match (left, right) {
        (Reference::Columns(a), Reference::Columns(b)) if a.sheet() == b.sheet() => {
            let (start, end) = (a.start().max(b.start()), a.end().min(b.end()));
            if start > end {
                return Err(ErrorKind::Null);
            }
            ColumnSpan::new(a.sheet().clone(), start, end)
                .map(Reference::Columns)
                .map_err(|_| ErrorKind::Ref)
        }
        (Reference::Rows(a), Reference::Rows(b)) if a.sheet() == b.sheet() => {
            let (start, end) = (a.start().max(b.start()), a.end().min(b.end()));
            if start > end {
                return Err(ErrorKind::Null);
            }
            RowSpan::new(a.sheet().clone(), start, end)
                .map(Reference::Rows)
                .map_err(|_| ErrorKind::Ref)
        }
        _ => left
            .to_range()
            .intersect(&right.to_range())
            .map(Reference::from_range)
            .ok_or(ErrorKind::Null),
    }
}

/// The rectangle of cells to read for `reference`
///
/// Whole-column and whole-row spans are cut to the sheet's used extent or
/// the sheet limits, depending on the configured policy. Rectangles larger
/// than `max_range_cells` are refused with `#NUM!`.
pub(crate) fn materialize(
    reference: &Reference,
    store: &dyn CellStore,
    config: &EvaluationConfig,
) -> Result<RangeReference, ErrorKind> {
    let extent = || match config.full_reference_policy {
        FullReferencePolicy::UsedExtent => store.used_extent(reference.sheet()).unwrap_or((1, 1)),
        FullReferencePolicy::SheetLimits => (MAX_ROWS, MAX_COLUMNS),
    };

    let range = match reference {
        Reference::Cell(cell) => RangeReference::single(cell.clone()),
        Reference::Range(range) => range.clone(),
        Reference::Columns(span) => span.bounded(extent().0),
        Reference::Rows(span) => span.bounded(extent().1),
    };

    if range.cell_count() > config.max_range_cells as u64 {
        debug!(
            range = %range,
            cells = range.cell_count(),
            limit = config.max_range_cells,
            "range exceeds enumeration cap"
        );
        return Err(ErrorKind::Num);
    }
    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Workbook;
    use pretty_assertions::assert_eq;

    fn r(text: &str) -> Reference {
        Reference::parse(text, "Sheet1").unwrap()
    }

    #[test]
    fn test_bounding() {
        assert_eq!(bounding(&r("B2"), &r("A1:A3")), Ok(r("A1:B3")));
        assert_eq!(bounding(&r("A:A"), &r("C:C")), Ok(r("A:C")));
        assert_eq!(bounding(&r("A1"), &r("Other!B2")), Err(ErrorKind::Ref));
    }

    #[test]
    fn test_intersect() {
        assert_eq!(intersect(&r("A1:C3"), &r("B2:D4")), Ok(r("B2:C3")));
        assert_eq!(intersect(&r("B:B"), &r("3:3")), Ok(r("B3")));
        assert_eq!(intersect(&r("A:B"), &r("B:C")), Ok(r("B:B")));
        assert_eq!(intersect(&r("A1"), &r("B2")), Err(ErrorKind::Null));
        assert_eq!(intersect(&r("A:A"), &r("C:C")), Err(ErrorKind::Null));
    }

    #[test]
    fn test_materialize_policies() {
        let mut wb = Workbook::new();
        wb.worksheet_mut(0).unwrap().set_cell_value("C5", 1).unwrap();

        let used = EvaluationConfig::default();
        assert_eq!(materialize(&r("A:B"), &wb, &used), Ok(r("A1:B5").to_range()));
        assert_eq!(materialize(&r("2:2"), &wb, &used), Ok(r("A2:C2").to_range()));

        let limits = EvaluationConfig::default()
            .with_full_reference_policy(FullReferencePolicy::SheetLimits);
        assert_eq!(
            materialize(&r("A:A"), &wb, &limits).map(|range| range.dimensions()),
            Ok((MAX_ROWS, 1))
        );
        assert_eq!(materialize(&r("A:Z"), &wb, &limits), Err(ErrorKind::Num));
    }
}
