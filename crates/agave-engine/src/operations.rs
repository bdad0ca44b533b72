//! File, app, and job operations.
//!
//! Remote paths given to these operations are resolved against the
//! client's remote working directory first.

use std::path::Path;

use agave_guide::{GuideError, JobParams, RequestKind, ids, job_document};
use bytes::Bytes;
use tracing::debug;

use crate::client::{AgaveClient, ClientState};
use crate::error::DispatchError;
use crate::events::EventNotifier;
use crate::path::resolve;
use crate::reply::{ReplyPayload, RequestState, TaskOutcome, TaskParams, TaskReply, reply_channel};
use crate::request::{DispatchArgs, Payload};

/// File name of job-submission uploads.
const JOB_UPLOAD_NAME: &str = "JSON";

impl<N: EventNotifier + 'static> AgaveClient<N> {
  /// Dispatch `guide_id` with arguments derived from the current state,
  /// attaching `params` to the reply.
  fn issue<F>(&self, guide_id: &str, prepare: F) -> Result<TaskReply, DispatchError>
  where
    F: FnOnce(&ClientState) -> Result<(DispatchArgs, TaskParams), DispatchError>,
  {
    let mut state = self.inner.lock();
    let (args, params) = prepare(&*state)?;
    let mut reply = self.inner.dispatch_locked(&mut *state, guide_id, args, None)?;
    reply.extend_params(params);
    Ok(reply)
  }

  /// Current remote working directory; empty at the root.
  pub fn working_directory(&self) -> String {
    self.inner.lock().working_dir.clone()
  }

  /// Change the remote working directory.
  ///
  /// Completes without contacting the service. A path that resolves to the
  /// root is rejected with `Fail` and leaves the directory unchanged. The
  /// reply's payload is the working directory afterwards.
  pub fn set_working_directory(&self, path: &str) -> Result<TaskReply, DispatchError> {
    let guide = self.inner.lookup(ids::CHANGE_DIR)?;
    let (mut reply, link) = reply_channel(guide);
    reply.insert_param("cd", path);

    let mut state = self.inner.lock();
    let resolved = resolve(path, &state.working_dir);
    let outcome = if resolved.is_empty() {
      TaskOutcome::with_payload(
        RequestState::Fail,
        ReplyPayload::RemotePath(state.working_dir.clone()),
      )
    } else {
      debug!(from = %state.working_dir, to = %resolved, "working directory changed");
      state.working_dir = resolved.clone();
      TaskOutcome::with_payload(RequestState::Good, ReplyPayload::RemotePath(resolved))
    };
    link.deliver(outcome);

    Ok(reply)
  }

  /// List a remote directory. The root lists the user's home directory.
  pub fn remote_ls(&self, dir: &str) -> Result<TaskReply, DispatchError> {
    self.issue(ids::DIR_LISTING, |state| {
      let mut resolved = resolve(dir, &state.working_dir);
      if resolved.is_empty() {
        resolved = format!("/{}", state.session.username());
      }
      Ok((
        DispatchArgs::new().url_arg(resolved.as_str()),
        params([("dirPath", resolved)]),
      ))
    })
  }

  pub fn delete_file(&self, path: &str) -> Result<TaskReply, DispatchError> {
    self.issue(ids::FILE_DELETE, |state| {
      let resolved = resolve(path, &state.working_dir);
      Ok((
        DispatchArgs::new().url_arg(resolved.as_str()),
        params([("toDelete", resolved)]),
      ))
    })
  }

  /// Move `from` to the remote path `to`.
  pub fn move_file(&self, from: &str, to: &str) -> Result<TaskReply, DispatchError> {
    self.transfer(ids::FILE_MOVE, from, to)
  }

  /// Copy `from` to the remote path `to`.
  pub fn copy_file(&self, from: &str, to: &str) -> Result<TaskReply, DispatchError> {
    self.transfer(ids::FILE_COPY, from, to)
  }

  fn transfer(&self, guide_id: &str, from: &str, to: &str) -> Result<TaskReply, DispatchError> {
    self.issue(guide_id, |state| {
      let from = resolve(from, &state.working_dir);
      let to = resolve(to, &state.working_dir);
      Ok((
        DispatchArgs::new().url_arg(from.as_str()).body_arg(to.as_str()),
        params([("from", from), ("to", to)]),
      ))
    })
  }

  /// Rename a remote file in place. `new_name` is a bare file name.
  pub fn rename_file(&self, path: &str, new_name: &str) -> Result<TaskReply, DispatchError> {
    self.issue(ids::RENAME_FILE, |state| {
      let resolved = resolve(path, &state.working_dir);
      Ok((
        DispatchArgs::new().url_arg(resolved.as_str()).body_arg(new_name),
        params([("fullName", resolved), ("newName", new_name.to_string())]),
      ))
    })
  }

  /// Create `new_name` inside the remote directory `location`.
  pub fn mk_remote_dir(&self, location: &str, new_name: &str) -> Result<TaskReply, DispatchError> {
    self.issue(ids::NEW_FOLDER, |state| {
      let resolved = resolve(location, &state.working_dir);
      Ok((
        DispatchArgs::new().url_arg(resolved.as_str()).body_arg(new_name),
        params([("location", resolved), ("newName", new_name.to_string())]),
      ))
    })
  }

  /// Upload a local file into the remote directory `location`.
  ///
  /// Refused when the local file cannot be opened.
  pub fn upload_file(
    &self,
    location: &str,
    local_path: impl AsRef<Path>,
  ) -> Result<TaskReply, DispatchError> {
    let local_path = local_path.as_ref();
    self.issue(ids::FILE_UPLOAD, |state| {
      let resolved = resolve(location, &state.working_dir);
      Ok((
        DispatchArgs::new()
          .url_arg(resolved.as_str())
          .payload(Payload::LocalFile(local_path.to_path_buf())),
        params([
          ("location", resolved),
          ("localFileName", local_path.display().to_string()),
        ]),
      ))
    })
  }

  /// Upload an in-memory buffer as `file_name` into `location`.
  pub fn upload_buffer(
    &self,
    location: &str,
    file_name: &str,
    data: impl Into<Bytes>,
  ) -> Result<TaskReply, DispatchError> {
    let data = data.into();
    self.issue(ids::FILE_PIPE_UPLOAD, |state| {
      let resolved = resolve(location, &state.working_dir);
      Ok((
        DispatchArgs::new()
          .url_arg(resolved.as_str())
          .payload(Payload::Buffer {
            file_name: file_name.to_string(),
            data,
          }),
        params([("location", resolved), ("fileName", file_name.to_string())]),
      ))
    })
  }

  /// Download a remote file into `local_dest`, which must not exist.
  pub fn download_file(
    &self,
    local_dest: impl AsRef<Path>,
    remote: &str,
  ) -> Result<TaskReply, DispatchError> {
    let local_dest = local_dest.as_ref();
    self.issue(ids::FILE_DOWNLOAD, |state| {
      let resolved = resolve(remote, &state.working_dir);
      Ok((
        DispatchArgs::new()
          .url_arg(resolved.as_str())
          .payload(Payload::Destination(local_dest.to_path_buf())),
        params([
          ("remoteName", resolved),
          ("localDest", local_dest.display().to_string()),
        ]),
      ))
    })
  }

  /// Download a remote file into memory.
  pub fn download_buffer(&self, remote: &str) -> Result<TaskReply, DispatchError> {
    self.issue(ids::FILE_PIPE_DOWNLOAD, |state| {
      let resolved = resolve(remote, &state.working_dir);
      Ok((
        DispatchArgs::new().url_arg(resolved.as_str()),
        params([("remoteName", resolved)]),
      ))
    })
  }

  pub fn app_list(&self) -> Result<TaskReply, DispatchError> {
    self.issue(ids::APP_LIST, |_| Ok((DispatchArgs::new(), TaskParams::new())))
  }

  pub fn list_jobs(&self) -> Result<TaskReply, DispatchError> {
    self.issue(ids::JOB_LIST, |_| Ok((DispatchArgs::new(), TaskParams::new())))
  }

  pub fn job_details(&self, job_id: &str) -> Result<TaskReply, DispatchError> {
    self.issue(ids::JOB_DETAILS, |_| {
      Ok((
        DispatchArgs::new().url_arg(job_id),
        params([("jobId", job_id.to_string())]),
      ))
    })
  }

  pub fn stop_job(&self, job_id: &str) -> Result<TaskReply, DispatchError> {
    self.issue(ids::STOP_JOB, |_| {
      Ok((
        DispatchArgs::new().url_arg(job_id),
        params([("jobId", job_id.to_string())]),
      ))
    })
  }

  /// Submit a job for the registered app `app_name`.
  ///
  /// A non-empty `remote_working_dir` is resolved and handed to the app's
  /// working-directory parameter, if it declares one. A parameter the app
  /// does not declare rejects the submission before anything is sent.
  pub fn run_remote_job(
    &self,
    app_name: &str,
    job_params: JobParams,
    remote_working_dir: Option<&str>,
  ) -> Result<TaskReply, DispatchError> {
    let app = self
      .inner
      .registry()
      .lookup(app_name)
      .ok()
      .filter(|guide| guide.kind() == RequestKind::JobApp)
      .ok_or_else(|| GuideError::NotAnApp {
        id: app_name.to_string(),
      })?;

    self.issue(ids::APP_START, |state| {
      let working_dir = remote_working_dir
        .filter(|dir| !dir.is_empty())
        .map(|dir| resolve(dir, &state.working_dir))
        .filter(|dir| !dir.is_empty());
      let document = job_document(&app, job_params, working_dir.clone())?;

      let mut reply_params = params([("jobName", app_name.to_string())]);
      if let Some(dir) = working_dir {
        reply_params.insert("remoteWorkingDir".to_string(), vec![dir]);
      }

      let args = DispatchArgs::new().payload(Payload::Buffer {
        file_name: JOB_UPLOAD_NAME.to_string(),
        data: Bytes::from(document.to_string()),
      });
      Ok((args, reply_params))
    })
  }
}

fn params<const K: usize>(pairs: [(&str, String); K]) -> TaskParams {
  pairs
    .into_iter()
    .map(|(name, value)| (name.to_string(), vec![value]))
    .collect()
}
