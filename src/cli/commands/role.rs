use crate::config::Config;
use crate::db::{Store, unique_violation};

pub async fn cmd_role_add(config: &Config, name: &str, rank: i32) -> anyhow::Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Role name cannot be empty");
    }

    let store = Store::new(&config.general.database_path).await?;
    match store.add_role_rank(name, rank).await {
        Ok(role) => {
            println!("Added role '{}' with rank {}", role.role_name, role.rank);
            Ok(())
        }
        Err(e) if unique_violation(&e).is_some() => {
            anyhow::bail!("Role '{name}' already exists")
        }
        Err(e) => Err(e),
    }
}

pub async fn cmd_role_list(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let roles = store.list_role_ranks().await?;

    if roles.is_empty() {
        println!("No roles defined.");
        println!();
        println!("Add one with: clubdesk role add \"President\" 1");
        return Ok(());
    }

    println!("Role Ranks ({} total)", roles.len());
    println!("{:-<40}", "");
    for role in roles {
        println!("{:>4}  {}", role.rank, role.role_name);
    }

    Ok(())
}
