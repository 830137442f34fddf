use anyhow::Result;
use vergen::EmitBuilder;

// Git revision shown by `dji_video_sync --version`
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=build.rs");
    EmitBuilder::builder()
        .git_sha(true)
        .git_commit_date()
        .emit()?;
    Ok(())
}
