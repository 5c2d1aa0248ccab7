use rust_xlsxwriter::Workbook;

pub(crate) const GRADE_HEADERS: [&str; 10] = [
    "Student Name",
    "Course",
    "Quiz 1",
    "Quiz 2",
    "Quiz 3",
    "Assignment 1",
    "Assignment 2",
    "Assignment 3",
    "Target Grade",
    "Course Weight",
];

/// Build an `.xlsx` with one sheet. Numeric-looking values become number cells,
/// empty strings leave the cell blank, everything else is written as text.
pub(crate) fn workbook(rows: &[&[&str]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            if value.is_empty() {
                continue;
            }
            match value.parse::<f64>() {
                Ok(number) => sheet.write_number(r, c, number).expect("write number"),
                Err(_) => sheet.write_string(r, c, *value).expect("write string"),
            };
        }
    }

    workbook.save_to_buffer().expect("save workbook")
}

pub(crate) fn grades_workbook(rows: &[&[&str]]) -> Vec<u8> {
    let mut all: Vec<&[&str]> = vec![&GRADE_HEADERS];
    all.extend_from_slice(rows);
    workbook(&all)
}
