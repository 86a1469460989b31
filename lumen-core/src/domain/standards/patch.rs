// lumen-core/src/domain/standards/patch.rs

use crate::domain::standards::rule::{EntityKind, FixAction};
use crate::domain::standards::validator::AutoFix;
use std::fmt::Write;

/// Renders auto-fix proposals into TMDL-style alteration statements for
/// human review. Returns `""` when there is nothing to patch; callers treat
/// that as "no patch produced", not as an error.
pub fn render_patch(fixes: &[AutoFix]) -> String {
    if fixes.is_empty() {
        return String::new();
    }

    let mut out = String::from("// Suggested safe statements (review before applying)\n");

    for fix in fixes {
        // A fix without table, current name or replacement cannot be
        // rendered; skip it rather than break the whole patch.
        if fix.table.is_empty() || fix.current.is_empty() || fix.suggested.is_empty() {
            continue;
        }

        let qualified = qualify(fix.entity, &fix.table, &fix.current);

        #[allow(clippy::unwrap_used)] // writing to a String cannot fail
        match &fix.action {
            FixAction::Rename => {
                writeln!(
                    out,
                    "ALTER {qualified} RENAME TO [{}];",
                    escape_brackets(&fix.suggested)
                )
                .unwrap();
            }
            FixAction::SetDisplayFolder => {
                writeln!(
                    out,
                    "ALTER {qualified} SET DISPLAYFOLDER = '{}';",
                    escape_single_quotes(&fix.suggested)
                )
                .unwrap();
            }
            FixAction::SetFormatString => {
                writeln!(
                    out,
                    "ALTER {qualified} SET FORMAT_STRING = \"{}\";",
                    fix.suggested.replace('"', "\"\"")
                )
                .unwrap();
            }
            FixAction::Unsupported(action) => {
                writeln!(
                    out,
                    "// Pending support for action '{action}' on {} {}.{} -> {}",
                    fix.entity, fix.table, fix.current, fix.suggested
                )
                .unwrap();
            }
        }
    }

    out
}

fn qualify(entity: EntityKind, table: &str, name: &str) -> String {
    let prefix = match entity {
        EntityKind::Measure => "MEASURE",
        // Queries and models never carry fixes today; COLUMN keeps the
        // statement well-formed if one slips through.
        _ => "COLUMN",
    };
    format!(
        "{prefix} '{}'[{}]",
        escape_single_quotes(table),
        escape_brackets(name)
    )
}

fn escape_single_quotes(value: &str) -> String {
    value.replace('\'', "''")
}

fn escape_brackets(value: &str) -> String {
    value.replace(']', "]]")
}
