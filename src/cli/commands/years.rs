use crate::config::Config;
use crate::db::Store;
use crate::domain::sort_year_ranges;
use crate::services::roster_service::select_default_range;

pub async fn cmd_years(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let ranges = sort_year_ranges(store.distinct_year_ranges().await?);

    if ranges.is_empty() {
        println!("No roster members stored yet.");
        return Ok(());
    }

    let default_range = select_default_range(&ranges);
    let hidden: Vec<String> = store
        .list_hidden_years()
        .await?
        .into_iter()
        .map(|row| row.year_range)
        .collect();

    println!("Year Ranges");
    println!("{:-<40}", "");
    for range in &ranges {
        let mut markers = Vec::new();
        if default_range.as_deref() == Some(range.as_str()) {
            markers.push("default");
        }
        if hidden.contains(range) {
            markers.push("hidden");
        }

        if markers.is_empty() {
            println!("  {range}");
        } else {
            println!("  {range} [{}]", markers.join(", "));
        }
    }

    Ok(())
}
