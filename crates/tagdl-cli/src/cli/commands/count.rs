//! `tagdl count <tag>` – remote post count for a tag.

use anyhow::Result;

use tagdl_core::remote::RemoteClient;

pub fn run_count(client: &RemoteClient, tag: &str) -> Result<()> {
    let count = client.post_count(tag)?;
    println!("{count}");
    Ok(())
}
