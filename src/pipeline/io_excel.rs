// Reading XLSX survey exports through calamine.

use calamine::{open_workbook, DataType, Reader, Xlsx};
use log::debug;
use snafu::prelude::*;

use crate::pipeline::io_common::render_cell;
use crate::pipeline::*;
use initiative_scoring::RawTable;

pub fn read_excel_table(path: &str, worksheet_name: Option<&str>) -> AnalysisResult<RawTable> {
    let wrange = get_range(path, worksheet_name)?;
    let mut iter = wrange.rows();
    let header_row = iter.next().context(EmptyExcelSnafu {})?;
    debug!("read_excel_table: header: {:?}", header_row);
    let headers: Vec<String> = header_row.iter().map(render_cell).collect();
    let rows: Vec<Vec<String>> = iter
        .map(|row| row.iter().map(render_cell).collect())
        .collect();
    Ok(RawTable { headers, rows })
}

// A worksheet name wins when provided; a single-sheet workbook needs none;
// anything else is ambiguous.
fn get_range(
    path: &str,
    worksheet_name: Option<&str>,
) -> AnalysisResult<calamine::Range<DataType>> {
    debug!(
        "read_excel_table: path: {:?} worksheet: {:?}",
        path, worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    if let Some(name) = worksheet_name {
        let wrange = workbook
            .worksheet_range(name)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path })?;
        return Ok(wrange);
    }

    let all_worksheets = workbook.worksheets();
    match all_worksheets.as_slice() {
        [] => EmptyExcelSnafu {}.fail(),
        [(name, wrange)] => {
            debug!("read_excel_table: using sole worksheet {:?}", name);
            Ok(wrange.clone())
        }
        _ => {
            whatever!(
                "The workbook {:?} has several worksheets, pass the worksheet name",
                path
            )
        }
    }
}
