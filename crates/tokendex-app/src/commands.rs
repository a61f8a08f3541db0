//! Command execution and terminal rendering.
//!
//! Commands read confirmation from `input` and write to `out`, so the
//! whole flow can be driven from tests with in-memory buffers.

use std::io::{BufRead, Write};

use tokendex_economy::{CollectionStats, EconomyController, EntityGenerator, sell_price, sorted};
use tokendex_types::{Entity, EntityEdit, EntityId};

use crate::cli::Command;
use crate::error::AppError;

/// Run one command against the controller.
///
/// # Errors
///
/// Returns [`AppError`] if the operation fails or output cannot be
/// written.
pub async fn execute<G, R, W>(
    command: Command,
    economy: &EconomyController<G>,
    input: &mut R,
    out: &mut W,
) -> Result<(), AppError>
where
    G: EntityGenerator,
    R: BufRead,
    W: Write,
{
    match command {
        Command::Balance => {
            writeln!(out, "Balance: {} tokens", economy.balance().await)?;
        }
        Command::List { sort } => {
            let entities = sorted(&economy.list().await?, sort.into());
            if entities.is_empty() {
                writeln!(out, "Your collection is empty. Try `tokendex generate`.")?;
            }
            for entity in &entities {
                writeln!(out, "{}", entity_line(entity))?;
            }
        }
        Command::Show { id } => {
            let entity = economy.get(EntityId(id)).await?;
            write_details(out, &entity)?;
        }
        Command::Generate => {
            let cost = economy.config().creation_cost;
            writeln!(out, "Generating (cost {cost} tokens)...")?;
            let entity = economy.generate().await?;
            writeln!(out, "New entity: {}", entity_line(&entity))?;
            writeln!(out, "Balance: {} tokens", economy.balance().await)?;
        }
        Command::Edit { id, name, prompt } => {
            if name.is_none() && prompt.is_none() {
                return Err(AppError::Usage {
                    message: String::from("Nothing to change: pass --name and/or --prompt."),
                });
            }
            let entity = economy.edit(EntityId(id), EntityEdit { name, prompt }).await?;
            writeln!(out, "Updated: {}", entity_line(&entity))?;
        }
        Command::Sell { id, yes } => {
            let entity = economy.get(EntityId(id)).await?;
            let price = sell_price(entity.rarity);
            let question = format!("Sell {} for {price} tokens?", entity.name);
            if !yes && !confirm(&question, input, out)? {
                writeln!(out, "Sale cancelled.")?;
                return Ok(());
            }
            let balance = economy.sell(&entity).await?;
            writeln!(out, "Sold {} for {price} tokens. Balance: {balance} tokens", entity.name)?;
        }
        Command::Delete { id } => {
            if economy.delete(EntityId(id)).await? {
                writeln!(out, "Deleted #{id}.")?;
            } else {
                writeln!(out, "No entity #{id}; nothing deleted.")?;
            }
        }
        Command::Stats => {
            write_stats(out, &economy.stats().await?)?;
        }
    }
    Ok(())
}

/// Ask a yes/no question; anything but `y`/`yes` is a no.
///
/// # Errors
///
/// Returns the I/O error if the prompt cannot be written or the answer
/// cannot be read.
pub fn confirm<R: BufRead, W: Write>(
    question: &str,
    input: &mut R,
    out: &mut W,
) -> std::io::Result<bool> {
    write!(out, "{question} [y/N] ")?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

/// One-line summary of an entity for listings.
#[must_use]
pub fn entity_line(entity: &Entity) -> String {
    format!(
        "#{:<4} [{:<2} {:<9}] {:<24} sells for {:>2}  ({})",
        entity.id,
        entity.rarity.code(),
        entity.rarity.label(),
        entity.name,
        sell_price(entity.rarity),
        entity.created_at.format("%Y-%m-%d %H:%M")
    )
}

fn write_details<W: Write>(out: &mut W, entity: &Entity) -> std::io::Result<()> {
    writeln!(out, "#{} {}", entity.id, entity.name)?;
    writeln!(out, "  rarity:  {} ({})", entity.rarity, entity.rarity.label())?;
    writeln!(out, "  value:   {} tokens", sell_price(entity.rarity))?;
    writeln!(out, "  created: {}", entity.created_at.to_rfc3339())?;
    writeln!(out, "  image:   {}", entity.image_url)?;
    writeln!(out, "  prompt:  {}", entity.prompt)
}

fn write_stats<W: Write>(out: &mut W, stats: &CollectionStats) -> std::io::Result<()> {
    writeln!(out, "Entities:         {}", stats.count)?;
    writeln!(out, "Balance:          {} tokens", stats.balance)?;
    writeln!(out, "Collection value: {} tokens", stats.collection_value)?;
    writeln!(out, "Net result:       {:+} tokens", stats.net_result)
}
