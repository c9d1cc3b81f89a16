use crate::error::ConditionError;
use crate::parser::StatementParser;

/// Cursory check that `condition` can be used on a breakpoint.
///
/// The condition must parse as exactly one expression statement that is not
/// a plain assignment. Side effects such as `y++` or `y += 10` are allowed.
pub fn validate_condition<P>(parser: &P, condition: &str) -> Result<(), ConditionError>
where
    P: StatementParser + ?Sized,
{
    if condition.is_empty() {
        return Ok(());
    }

    // the terminator rejects partial expressions like "y=="
    let text = format!("{condition} ;");
    let statements = parser
        .parse_statement_list(&text)
        .map_err(|source| ConditionError::Parse {
            condition: condition.to_string(),
            source,
        })?;

    let structure = |reason| ConditionError::Structure {
        condition: condition.to_string(),
        reason,
    };

    let expr = match statements.as_slice() {
        [] => return Err(structure("is not empty, but has nothing to evaluate")),
        [single] => single
            .expression()
            .ok_or_else(|| structure("must be an expression"))?,
        _ => return Err(structure("must be an expression")),
    };

    if expr.is_assignment() {
        return Err(ConditionError::Assignment {
            condition: condition.to_string(),
        });
    }

    Ok(())
}
