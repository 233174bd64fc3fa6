use clap::Args;

use toolchain::publish::{self, PublishResult};
use toolchain::runner::SystemRunner;

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct PublishArgs {}

pub fn run(_args: PublishArgs, global: &GlobalArgs) -> CmdResult<PublishResult> {
    let root = global.root()?;
    Ok((publish::publish(&root, &SystemRunner)?, 0))
}
