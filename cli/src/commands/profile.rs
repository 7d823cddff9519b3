use std::path::{Path, PathBuf};

use clap::Args;
use sch_core::domain::PhotoBlob;
use sch_core::error::AppError;
use sch_core::remote::{AuthApi, UserApi};

use crate::context::AppContext;

#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Save the profile photo here (a directory gets `profile.<ext>`)
    #[arg(long, value_name = "PATH")]
    pub photo_out: Option<PathBuf>,
}

fn target_path(out: &Path, photo: &PhotoBlob) -> PathBuf {
    if out.is_dir() {
        out.join(&photo.file_name)
    } else {
        out.to_path_buf()
    }
}

pub fn write_photo(out: &Path, photo: &PhotoBlob) -> Result<PathBuf, AppError> {
    let path = target_path(out, photo);
    std::fs::write(&path, &photo.bytes).map_err(|e| {
        AppError::new("IO_PHOTO_WRITE_FAILED", "Failed to save profile photo")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    Ok(path)
}

pub fn show(ctx: &AppContext, args: ProfileArgs) -> Result<(), AppError> {
    let sessions = ctx.sessions();
    sessions.require_token()?;

    let user = ctx.auth()?.current_user()?;
    sessions.save_user(&user)?;
    println!("Name:   {}", user.display_name());
    println!("Email:  {}", user.email);
    println!("Role:   {:?}", user.role);
    if let Some(phone) = &user.phone {
        println!("Phone:  {phone}");
    }

    let Some(out) = args.photo_out else {
        return Ok(());
    };
    match ctx.users()?.profile_photo()? {
        Some(photo) => {
            let path = write_photo(&out, &photo)?;
            println!("Photo:  saved {} bytes to {}", photo.len(), path.display());
        }
        None => println!("Photo:  none uploaded"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_lands_in_directory_or_exact_path() {
        let dir = tempfile::tempdir().unwrap();
        let photo = PhotoBlob::new("profile.png", "image/png", vec![1, 2, 3]).unwrap();

        let in_dir = write_photo(dir.path(), &photo).unwrap();
        assert_eq!(in_dir, dir.path().join("profile.png"));

        let exact = dir.path().join("me.png");
        assert_eq!(write_photo(&exact, &photo).unwrap(), exact);
        assert_eq!(std::fs::read(exact).unwrap(), vec![1, 2, 3]);
    }
}
