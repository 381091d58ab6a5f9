//! Looking up abilities on a character sheet and rolling checks against them.

use crate::config::LayoutConfig;
use crate::dice::{self, Sign};
use crate::document::{find_sheet, DocumentClient};
use crate::error::{Result, SheetError};
use crate::range::ColumnRange;
use rand::Rng;
use serde::Serialize;

/// At most this many candidates are reported for an ambiguous name.
pub const MAX_CANDIDATES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ability {
    pub name: String,
    pub value: i64,
}

/// Every named row of `sheet` with an integer value in the check column.
pub fn read_abilities<C: DocumentClient>(
    client: &C,
    doc_id: &str,
    sheet: &str,
    layout: &LayoutConfig,
) -> Result<Vec<Ability>> {
    let sheets = client.list_sheets(doc_id)?;
    if find_sheet(&sheets, sheet).is_none() {
        return Err(SheetError::SheetNotFound(sheet.to_string()));
    }
    let ranges = [
        ColumnRange::whole(sheet, layout.key_column),
        ColumnRange::whole(sheet, layout.check_value_column),
    ];
    let results = client.batch_get_values(doc_id, &ranges)?;
    let [keys, values] = <[_; 2]>::try_from(results).map_err(|r: Vec<_>| {
        SheetError::UnexpectedResponse(format!("expected 2 ranges, got {}", r.len()))
    })?;
    let values = values.first_column();
    let mut out = Vec::new();
    for (i, key) in keys.first_column().into_iter().enumerate() {
        let Some(name) = key.map(str::trim).filter(|k| !k.is_empty()) else {
            continue;
        };
        let raw = values.get(i).copied().flatten().map(str::trim).unwrap_or("");
        let value = if raw.is_empty() {
            0
        } else {
            match raw.parse::<i64>() {
                Ok(v) => v,
                // headings and formulas rendered as text
                Err(_) => continue,
            }
        };
        out.push(Ability {
            name: name.to_string(),
            value,
        });
    }
    Ok(out)
}

/// Resolve `query` to exactly one ability.
///
/// Substring match, case-sensitive first and case-insensitive only when the
/// first pass finds nothing. Several hits are ambiguous unless one of them
/// is the query itself.
pub fn find_ability<'a>(abilities: &'a [Ability], query: &str) -> Result<&'a Ability> {
    let mut hits: Vec<&Ability> = abilities.iter().filter(|a| a.name.contains(query)).collect();
    if hits.is_empty() {
        let lowered = query.to_lowercase();
        hits = abilities
            .iter()
            .filter(|a| a.name.to_lowercase().contains(&lowered))
            .collect();
    }
    match hits.as_slice() {
        [] => Err(SheetError::AbilityNotFound(query.to_string())),
        [only] => Ok(only),
        many => {
            if let Some(exact) = many
                .iter()
                .find(|a| a.name == query)
                .or_else(|| many.iter().find(|a| a.name.eq_ignore_ascii_case(query)))
            {
                return Ok(exact);
            }
            let candidates: Vec<&str> = many
                .iter()
                .take(MAX_CANDIDATES)
                .map(|a| a.name.as_str())
                .collect();
            Err(SheetError::AmbiguousAbility {
                query: query.to_string(),
                candidates: candidates.join(", "),
            })
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub character: String,
    pub abilities: Vec<(Sign, Ability)>,
    pub plus: i64,
    pub minus: i64,
    pub total: i64,
}

impl CheckOutcome {
    /// `Hero rolls 2 x Str + d4 - d4 = 10 + 3 - 1 = 12`
    pub fn describe(&self) -> String {
        if let [(_, single)] = self.abilities.as_slice() {
            return format!(
                "{} rolls 2 x {} + d4 - d4 = {} + {} - {} = {}",
                self.character,
                single.name,
                2 * single.value,
                self.plus,
                self.minus,
                self.total
            );
        }
        let mut names = String::new();
        let mut values = String::new();
        for (i, (sign, ability)) in self.abilities.iter().enumerate() {
            if i > 0 {
                names.push_str(&format!(" {sign} "));
                values.push_str(&format!(" {sign} "));
            }
            names.push_str(&ability.name);
            values.push_str(&ability.value.to_string());
        }
        format!(
            "{} rolls {names} + d4 - d4 = {values} + {} - {} = {}",
            self.character, self.plus, self.minus, self.total
        )
    }
}

/// Roll `ABILITY (SEP ABILITY)*` against `character`'s sheet. A single
/// ability counts double.
pub fn check<C: DocumentClient, R: Rng, S: AsRef<str>>(
    client: &C,
    doc_id: &str,
    character: &str,
    layout: &LayoutConfig,
    args: &[S],
    rng: &mut R,
) -> Result<CheckOutcome> {
    let terms = dice::split_signed(args)?;
    let abilities = read_abilities(client, doc_id, character, layout)?;
    let resolved = terms
        .iter()
        .map(|(sign, query)| find_ability(&abilities, query).map(|a| (*sign, a.clone())))
        .collect::<Result<Vec<_>>>()?;
    Ok(roll_check(character, resolved, rng))
}

pub fn roll_check<R: Rng>(
    character: &str,
    abilities: Vec<(Sign, Ability)>,
    rng: &mut R,
) -> CheckOutcome {
    let plus = dice::d4(rng);
    let minus = dice::d4(rng);
    let base: i64 = match abilities.as_slice() {
        [(_, single)] => 2 * single.value,
        many => many.iter().map(|(sign, a)| sign.apply(a.value)).sum(),
    };
    CheckOutcome {
        character: character.to_string(),
        abilities,
        plus,
        minus,
        total: base + plus - minus,
    }
}
