/// Runs `$body` with `$table` bound to the entity module of the given kind.
///
/// Both application tables expose the same Rust field names, so a body
/// written once type-checks against either module.
macro_rules! with_application_table {
    ($kind:expr, $table:ident => $body:block) => {
        match $kind {
            $crate::types::ApplicationKind::Planting => {
                use $crate::models::planting_applications as $table;
                $body
            }
            $crate::types::ApplicationKind::Replanting => {
                use $crate::models::replanting_applications as $table;
                $body
            }
        }
    };
}

pub mod applications;
pub mod references;
pub mod statistics;
pub mod users;

/// Restricts a query to one owner when `owner` is set; matches everything otherwise.
pub(crate) fn owned_by<C: sea_orm::ColumnTrait>(column: C, owner: Option<i32>) -> sea_orm::Condition {
    match owner {
        Some(owner) => sea_orm::Condition::all().add(column.eq(owner)),
        None => sea_orm::Condition::all(),
    }
}

/// Escapes `LIKE` wildcards in user input and wraps it for a substring match.
pub(crate) fn contains_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('%');
    for c in value.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::contains_pattern;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(contains_pattern("Hill"), "%hill%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }
}
