//! Synthetic report documents for integration tests: hand-built pages with
//! the words, headings, and provider tables a real filing would carry.

use psp_report_extract::{BBox, Page, PageTable, ReportDocument, TableRow, Word};

pub fn word(text: &str, top: f32, left: f32) -> Word {
    Word {
        text: text.to_string(),
        top,
        left,
        right: left + 40.0,
    }
}

pub fn row(top: f32, cells: &[&str]) -> TableRow {
    TableRow {
        top,
        cells: cells.iter().map(ToString::to_string).collect(),
    }
}

pub fn table(top: f32, bottom: f32, rows: Vec<TableRow>) -> PageTable {
    PageTable {
        bbox: BBox {
            left: 20.0,
            top,
            right: 580.0,
            bottom,
        },
        rows,
    }
}

fn supply_page() -> Page {
    Page {
        number: 1,
        text: "DAILY PSP REPORT FOR 04-Jan-2024\nDATE OF REPORTING: 05-Jan-2024 AT 10:30\n"
            .to_string(),
        words: vec![word("2(A)", 100.0, 20.0)],
        tables: vec![table(
            110.0,
            320.0,
            vec![
                row(115.0, &["STATE", "GENERATION (MU)", "", "", "", "", "", "", "", "", "", "", ""]),
                row(
                    125.0,
                    &[
                        "", "THERMAL", "HYDRO", "GAS", "SOLAR", "WIND", "OTHERS", "NET SCH",
                        "DRAWAL", "UI", "AVAILABILITY", "DEMAND MET", "SHORTAGE",
                    ],
                ),
                row(
                    140.0,
                    &[
                        "ANDHRA PRADESH", "120.5", "30.2", "4.1", "28.0", "15.5", "1.2", "55.0",
                        "54.1", "-0.9", "199.5", "198.0", "1.5",
                    ],
                ),
                row(
                    150.0,
                    &[
                        "KARNATAKA", "95.0", "48.8", "0.0", "40.2", "22.1", "2.0", "30.5", "31.0",
                        "0.5", "208.1", "208.1", "0.0",
                    ],
                ),
                row(
                    160.0,
                    &[
                        "Tamilnadu", "140.2", "12.4", "8.8", "35.7", "44.0", "3.1", "60.2", "59.8",
                        "-0.4", "244.2", "243.0", "1.2",
                    ],
                ),
                row(
                    170.0,
                    &[
                        "REGION", "355.7", "91.4", "12.9", "103.9", "81.6", "6.3", "145.7",
                        "144.9", "-0.8", "651.8", "649.1", "2.7",
                    ],
                ),
                row(180.0, &["NOTE: figures are provisional", "", "", "", "", "", "", "", "", "", "", "", ""]),
            ],
        )],
    }
}

fn generation_page_new() -> Page {
    Page {
        number: 3,
        text: String::new(),
        words: vec![word("3(B)", 50.0, 20.0)],
        tables: vec![table(
            60.0,
            700.0,
            vec![
                row(
                    70.0,
                    &[
                        "STATION", "INST. CAPACITY (MW)", "19:00 HRS PEAK", "03:00 HRS OFF-PEAK",
                        "DAY PEAK (MW)", "HRS", "MIN GENERATION (MW)", "HRS", "GROSS GEN (MU)",
                        "NET GEN (MU)", "AVG (MW)",
                    ],
                ),
                row(80.0, &["CENTRAL SECTOR", ""]),
                row(
                    90.0,
                    &[
                        "NTPC KUDGI", "2400", "2100", "1800", "2150", "19:15", "1200", "03:40",
                        "48.2", "45.1", "1880",
                    ],
                ),
                row(
                    100.0,
                    &[
                        "MAPS", "440", "410", "400", "415", "12:00", "390", "02:10", "9.8", "9.1",
                        "405",
                    ],
                ),
                row(
                    110.0,
                    &[
                        "TOTAL ISGS", "2840", "2510", "2200", "2565", "19:15", "58.0", "54.2",
                        "2285",
                    ],
                ),
                row(120.0, &["JOINT VENTURE", ""]),
                row(
                    130.0,
                    &[
                        "NTECL VALLUR", "1500", "1310", "1200", "1330", "20:00", "900", "01:15",
                        "31.0", "29.0", "1290",
                    ],
                ),
                row(
                    140.0,
                    &["TOTAL JV", "1500", "1310", "1200", "1330", "20:00", "31.0", "29.0", "1290"],
                ),
                row(150.0, &["IPP UNDER OPEN ACCESS", ""]),
                row(160.0, &["SEMBCORP", "1320", "1250", "1100", "1280", "18:30", "28.0", "26.5", "1210"]),
            ],
        )],
    }
}

/// A well-formed new-layout southern report. Carries the 2(A) supply grid
/// and the 3(B) generation table, but no 2(C) demand table.
pub fn southern_new_report() -> ReportDocument {
    ReportDocument::new(vec![supply_page(), generation_page_new()])
}

/// An old-layout report: only the 3(B) table, headed by the day-energy
/// column vocabulary. The reporting label and its date are separated by
/// intervening text, so only the loose scan can resolve it.
pub fn southern_old_report() -> ReportDocument {
    let first = Page {
        number: 1,
        text: "DATE OF REPORTING -\nprovisional figures, see annexure\n12-Mar-2023\n"
            .to_string(),
        words: Vec::new(),
        tables: Vec::new(),
    };
    let generation = Page {
        number: 2,
        text: String::new(),
        words: vec![word("3(B)", 40.0, 20.0)],
        tables: vec![table(
            50.0,
            600.0,
            vec![
                row(
                    60.0,
                    &[
                        "STATION", "INST. CAPACITY (MW)", "PEAK", "OFF-PEAK", "DAY PEAK (MW)",
                        "HRS", "DAY ENERGY (MU)", "AVG (MW)",
                    ],
                ),
                row(70.0, &["CENTRAL SECTOR", ""]),
                row(
                    80.0,
                    &["NTPC RAMAGUNDAM", "2600", "2450", "2300", "2480", "20:30", "57.5", "2395"],
                ),
                row(
                    90.0,
                    &["TOTAL ISGS", "2600", "2450", "2300", "2480", "20:30", "57.5", "2395"],
                ),
                row(100.0, &["JOINT VENTURE", ""]),
                row(110.0, &["TOTAL JV", "-", "-", "-", "-", "-", "-", "-"]),
                row(120.0, &["STATE SECTOR", ""]),
            ],
        )],
    };
    ReportDocument::new(vec![first, generation])
}

/// A document with pages but nothing extractable: no headings, no dates.
pub fn empty_report() -> ReportDocument {
    ReportDocument::new(vec![Page {
        number: 1,
        text: "nothing to see".to_string(),
        words: Vec::new(),
        tables: Vec::new(),
    }])
}
