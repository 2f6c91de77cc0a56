//! Reference functions
//!
//! These read the reference an argument denotes rather than its values, and
//! some of them build new references at evaluation time. Each one that
//! returns a reference has a `ref_*` form used where a reference is
//! required, and an `fn_*` form that resolves the result to values.

use super::integer_arg;
use crate::ast::Expr;
use crate::evaluator::EvaluationContext;
use crate::store::is_valid_name;
use gridcalc_core::{
    parse_r1c1, ColumnSpan, Error, ErrorKind, RangeReference, Reference, RowSpan, TypedValue,
};

fn number(result: Result<u32, ErrorKind>) -> TypedValue {
    match result {
        Ok(n) => TypedValue::Number(n as f64),
        Err(e) => TypedValue::Error(e),
    }
}

/// Integer value of an optional argument; omitted arguments are `None`
fn optional_integer(
    args: &[Expr],
    index: usize,
    ctx: &EvaluationContext,
) -> Result<Option<i64>, ErrorKind> {
    match args.get(index) {
        None | Some(Expr::Missing) => Ok(None),
        Some(arg) => integer_arg(&ctx.evaluate_scalar(arg)).map(Some),
    }
}

/// ROW function; the current cell's row when called without arguments
pub fn fn_row(args: &[Expr], ctx: &EvaluationContext) -> TypedValue {
    match args.first() {
        None | Some(Expr::Missing) => number(Ok(ctx.current_cell().row())),
        Some(arg) => number(ctx.reference(arg).map(|r| r.top_left().row())),
    }
}

/// COLUMN function; the current cell's column when called without arguments
pub fn fn_column(args: &[Expr], ctx: &EvaluationContext) -> TypedValue {
    match args.first() {
        None | Some(Expr::Missing) => number(Ok(ctx.current_cell().column())),
        Some(arg) => number(ctx.reference(arg).map(|r| r.top_left().column())),
    }
}

/// Rows and columns of a reference or array argument
///
/// References report their nominal size, so `ROWS(A:A)` is the sheet height
/// however few cells are populated.
fn dimensions(arg: &Expr, ctx: &EvaluationContext) -> Result<(u32, u32), ErrorKind> {
    if ctx.is_reference(arg) {
        return ctx.reference(arg).map(|r| r.dimensions());
    }
    let value = ctx.evaluate(arg);
    if let TypedValue::Error(e) = value {
        return Err(e);
    }
    let (rows, columns) = value.dimensions();
    Ok((rows as u32, columns as u32))
}

/// ROWS function
pub fn fn_rows(args: &[Expr], ctx: &EvaluationContext) -> TypedValue {
    number(dimensions(&args[0], ctx).map(|(rows, _)| rows))
}

/// COLUMNS function
pub fn fn_columns(args: &[Expr], ctx: &EvaluationContext) -> TypedValue {
    number(dimensions(&args[0], ctx).map(|(_, columns)| columns))
}

/// AREAS function
pub fn fn_areas(args: &[Expr], ctx: &EvaluationContext) -> TypedValue {
    number(ctx.areas(&args[0]).map(|areas| areas.len() as u32))
}

/// OFFSET(reference, rows, cols, [height], [width])
pub fn ref_offset(args: &[Expr], ctx: &EvaluationContext) -> Result<Reference, ErrorKind> {
    let base = ctx.reference(&args[0])?;
    let rows = optional_integer(args, 1, ctx)?.unwrap_or(0);
    let columns = optional_integer(args, 2, ctx)?.unwrap_or(0);

    let (base_height, base_width) = base.dimensions();
    let height = optional_integer(args, 3, ctx)?.unwrap_or(i64::from(base_height));
    let width = optional_integer(args, 4, ctx)?.unwrap_or(i64::from(base_width));
    if height < 1 || width < 1 {
        return Err(ErrorKind::Ref);
    }

    let moved = base.offset(rows, columns).map_err(|_| ErrorKind::Ref)?;
    if (height, width) == (i64::from(base_height), i64::from(base_width)) {
        return Ok(moved);
    }
    moved.resize(height, width).map_err(|_| ErrorKind::Ref)
}

/// OFFSET function
pub fn fn_offset(args: &[Expr], ctx: &EvaluationContext) -> TypedValue {
    match ref_offset(args, ctx) {
        Ok(reference) => ctx.resolve(&reference),
        Err(e) => TypedValue::Error(e),
    }
}

/// INDIRECT(text, [a1])
///
/// The text is an A1 reference, an R1C1 reference when `a1` is FALSE, or a
/// defined name. Anything else, including a sheet that does not exist, is
/// `#REF!`.
pub fn ref_indirect(args: &[Expr], ctx: &EvaluationContext) -> Result<Reference, ErrorKind> {
    let text = ctx.evaluate_scalar(&args[0]).to_text()?;
    let text = text.trim();
    let a1 = match args.get(1) {
        None | Some(Expr::Missing) => true,
        Some(arg) => ctx.evaluate_scalar(arg).to_bool()?,
    };

    let parsed = if a1 {
        Reference::parse_in(text, ctx.sheet())
    } else {
        parse_r1c1(text, ctx.current_cell())
    };

    let reference = match parsed {
        Ok(reference) => reference,
        Err(_) if is_valid_name(text) => ctx
            .reference(&Expr::Name(text.to_string()))
            .map_err(|_| ErrorKind::Ref)?,
        Err(_) => return Err(ErrorKind::Ref),
    };

    if !ctx.store().sheet_exists(reference.sheet()) {
        return Err(ErrorKind::Ref);
    }
    Ok(reference)
}

/// INDIRECT function
pub fn fn_indirect(args: &[Expr], ctx: &EvaluationContext) -> TypedValue {
    match ref_indirect(args, ctx) {
        Ok(reference) => ctx.resolve(&reference),
        Err(e) => TypedValue::Error(e),
    }
}

/// Row and column picked by INDEX inside an area of the given size
///
/// 0 selects the whole row or column. With only a row number, a single-row
/// area is indexed along its columns.
fn index_position(
    args: &[Expr],
    ctx: &EvaluationContext,
    (rows, columns): (u32, u32),
) -> Result<(u32, u32), ErrorKind> {
    let first = optional_integer(args, 1, ctx)?.unwrap_or(0);
    let column = optional_integer(args, 2, ctx)?;

    let (row, column) = match column {
        Some(column) => (first, column),
        None if rows == 1 && columns > 1 => (1, first),
        None => (first, if columns == 1 { 1 } else { 0 }),
    };
    if row < 0 || column < 0 {
        return Err(ErrorKind::Value);
    }
    if row > i64::from(rows) || column > i64::from(columns) {
        return Err(ErrorKind::Ref);
    }
    Ok((row as u32, column as u32))
}

/// Part of an area at a 1-based position, where 0 spans the dimension
fn sub_reference(area: &Reference, row: u32, column: u32) -> Result<Reference, ErrorKind> {
    let invalid = |_: Error| ErrorKind::Ref;
    match (area, row, column) {
        (_, 0, 0) => Ok(area.clone()),
        (Reference::Columns(span), 0, column) => {
            let index = span.start() + column - 1;
            ColumnSpan::new(span.sheet().clone(), index, index)
                .map(Reference::Columns)
                .map_err(invalid)
        }
        (Reference::Rows(span), row, 0) => {
            let index = span.start() + row - 1;
            RowSpan::new(span.sheet().clone(), index, index)
                .map(Reference::Rows)
                .map_err(invalid)
        }
        (_, row, column) => {
            let range = area.to_range();
            let (rows, columns) = range.dimensions();
            let (top, bottom) = if row == 0 { (0, rows - 1) } else { (row - 1, row - 1) };
            let (left, right) = if column == 0 {
                (0, columns - 1)
            } else {
                (column - 1, column - 1)
            };
            let start = range.cell_at(top, left).map_err(invalid)?;
            let end = range.cell_at(bottom, right).map_err(invalid)?;
            RangeReference::new(start, end)
                .map(Reference::from_range)
                .map_err(invalid)
        }
    }
}

/// INDEX(reference, row, [column], [area])
pub fn ref_index(args: &[Expr], ctx: &EvaluationContext) -> Result<Reference, ErrorKind> {
    let areas = ctx.areas(&args[0])?;
    let area_number = optional_integer(args, 3, ctx)?.unwrap_or(1);
    if area_number < 1 || area_number as usize > areas.len() {
        return Err(ErrorKind::Ref);
    }
    let area = &areas[area_number as usize - 1];

    let (row, column) = index_position(args, ctx, area.dimensions())?;
    sub_reference(area, row, column)
}

/// INDEX function, in reference or array form
pub fn fn_index(args: &[Expr], ctx: &EvaluationContext) -> TypedValue {
    if ctx.is_reference(&args[0]) {
        return match ref_index(args, ctx) {
            Ok(reference) => ctx.resolve(&reference),
            Err(e) => TypedValue::Error(e),
        };
    }

    let value = ctx.evaluate(&args[0]);
    let rows = match value {
        TypedValue::Error(e) => return TypedValue::Error(e),
        TypedValue::Array(rows) => rows,
        scalar => vec![vec![scalar]],
    };
    let dimensions = (rows.len() as u32, rows.first().map_or(0, Vec::len) as u32);
    let (row, column) = match index_position(args, ctx, dimensions) {
        Ok(position) => position,
        Err(e) => return TypedValue::Error(e),
    };

    match (row, column) {
        (0, 0) => TypedValue::Array(rows),
        (0, column) => TypedValue::Array(
            rows.into_iter()
                .map(|r| vec![r[column as usize - 1].clone()])
                .collect(),
        ),
        (row, 0) => TypedValue::Array(vec![rows[row as usize - 1].clone()]),
        (row, column) => rows[row as usize - 1][column as usize - 1].clone(),
    }
}
