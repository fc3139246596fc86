//! Application state for an interactive speech session.
//!
//! The session owns the speech client, the current voice settings, the
//! persisted API key and the history of generated clips with their
//! playback handles.

mod controller;
mod playback;

pub use controller::{HistoryEntry, PREVIEW_CHARS, Session, SessionError, preview};
#[cfg(test)]
pub use playback::MockAudioOutput;
pub use playback::{AudioOutput, PlaybackError, PlaybackHandle, SessionAudio, player_args};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, GenerateContentResponse, MockBackend};
    use crate::engine::{Credential, SynthesisError, VoiceSelector};
    use crate::store::CredentialStore;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn audio_response() -> GenerateContentResponse {
        GenerateContentResponse::with_audio(STANDARD.encode([1u8, 0, 2, 0, 3, 0]))
    }

    fn counting_output() -> MockAudioOutput {
        let mut output = MockAudioOutput::new();
        let mut clips = 0;
        output.expect_register().returning(move |_| {
            clips += 1;
            Ok(PlaybackHandle::new(PathBuf::from(format!("clip-{clips}.wav"))))
        });
        output.expect_play().returning(|_, _| Ok(()));
        output
    }

    fn store_in(temp_dir: &TempDir) -> CredentialStore {
        CredentialStore::with_path(temp_dir.path().join("settings.json"))
    }

    fn session_with(
        backend: MockBackend,
        output: MockAudioOutput,
        temp_dir: &TempDir,
    ) -> Session<MockBackend, MockAudioOutput> {
        Session::new(backend, output, store_in(temp_dir), Credential::new("env-key"))
    }

    // ===========================================
    // Credential lifecycle
    // ===========================================

    #[test]
    fn test_stored_credential_wins_over_fallback() {
        let temp_dir = TempDir::new().unwrap();
        store_in(&temp_dir)
            .save(&Credential::new("stored-key").unwrap())
            .unwrap();

        let session = session_with(MockBackend::new(), MockAudioOutput::new(), &temp_dir);
        assert_eq!(session.credential().unwrap().expose(), "stored-key");
    }

    #[test]
    fn test_fallback_credential_used_when_nothing_stored() {
        let temp_dir = TempDir::new().unwrap();
        let session = session_with(MockBackend::new(), MockAudioOutput::new(), &temp_dir);

        assert_eq!(session.credential().unwrap().expose(), "env-key");
    }

    #[test]
    fn test_save_credential_persists_and_clears_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let mut backend = MockBackend::new();
        backend.expect_generate_content().times(1).returning(|_, _, _| {
            Err(BackendError::Api {
                code: 429,
                status: "RESOURCE_EXHAUSTED".to_string(),
                message: "Quota exceeded".to_string(),
            })
        });
        let mut session = session_with(backend, MockAudioOutput::new(), &temp_dir);

        let err = session.generate("Hello").unwrap_err();
        assert!(err.needs_credential_prompt());
        assert!(session.needs_credential());
        assert!(session.last_error().unwrap().contains("429"));

        assert!(session.save_credential("  fresh-key ").unwrap());
        assert!(!session.needs_credential());
        assert!(session.last_error().is_none());
        assert_eq!(session.credential().unwrap().expose(), "fresh-key");

        let reloaded = store_in(&temp_dir).load().unwrap().unwrap();
        assert_eq!(reloaded.expose(), "fresh-key");
    }

    #[test]
    fn test_save_blank_credential_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = session_with(MockBackend::new(), MockAudioOutput::new(), &temp_dir);

        assert!(!session.save_credential("   ").unwrap());
        assert_eq!(session.credential().unwrap().expose(), "env-key");
        assert!(!store_in(&temp_dir).path().exists());
    }

    // ===========================================
    // Generation
    // ===========================================

    #[test]
    fn test_generate_prepends_and_plays() {
        let temp_dir = TempDir::new().unwrap();
        let mut backend = MockBackend::new();
        backend
            .expect_generate_content()
            .times(2)
            .returning(|_, _, _| Ok(audio_response()));

        let mut output = MockAudioOutput::new();
        let mut clips = 0;
        output.expect_register().times(2).returning(move |wav| {
            assert!(wav.starts_with(b"RIFF"));
            clips += 1;
            Ok(PlaybackHandle::new(PathBuf::from(format!("clip-{clips}.wav"))))
        });
        output
            .expect_play()
            .withf(|_, rate| *rate == 1.25)
            .times(2)
            .returning(|_, _| Ok(()));

        let mut session = session_with(backend, output, &temp_dir);
        session.config_mut().speed = 1.25;

        let first = session.generate("First clip").unwrap().id;
        let second = session.generate("Second clip").unwrap().id;

        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, second);
        assert_eq!(history[1].id, first);
        assert_eq!(history[0].preview, "Second clip");
        assert_eq!(history[0].audio.frames, 3);
        assert_eq!(session.active().unwrap().id, second);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_generate_playback_failure_is_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let mut backend = MockBackend::new();
        backend
            .expect_generate_content()
            .returning(|_, _, _| Ok(audio_response()));

        let mut output = MockAudioOutput::new();
        output
            .expect_register()
            .returning(|_| Ok(PlaybackHandle::new(PathBuf::from("clip.wav"))));
        output.expect_play().returning(|_, _| {
            Err(PlaybackError::InvalidPlayer("missing".to_string()))
        });

        let mut session = session_with(backend, output, &temp_dir);
        assert!(session.generate("Hello").is_ok());
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_custom_voice_without_details_rejected_before_dispatch() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = session_with(MockBackend::new(), MockAudioOutput::new(), &temp_dir);
        session.config_mut().voice = VoiceSelector::Custom;

        let err = session.generate("Hello").unwrap_err();
        assert!(matches!(
            err,
            SessionError::Synthesis(SynthesisError::CustomVoiceUnspecified)
        ));
        assert!(session.last_error().is_some());
        assert!(!session.needs_credential());
    }

    #[test]
    fn test_blank_text_is_not_dispatched() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = session_with(MockBackend::new(), MockAudioOutput::new(), &temp_dir);

        let err = session.generate("  ").unwrap_err();
        assert!(matches!(
            err,
            SessionError::Synthesis(SynthesisError::EmptyInput)
        ));
    }

    #[test]
    fn test_failure_leaves_history_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let mut backend = MockBackend::new();
        backend.expect_generate_content().returning(|_, _, _| {
            Err(BackendError::ConnectionFailed("reset by peer".to_string()))
        });
        let mut session = session_with(backend, MockAudioOutput::new(), &temp_dir);

        let err = session.generate("Hello").unwrap_err();
        assert!(!err.needs_credential_prompt());
        assert!(session.history().is_empty());
        assert!(session.active().is_none());
        assert!(session.last_error().unwrap().contains("reset by peer"));
    }

    #[test]
    fn test_generate_rejected_while_busy() {
        let temp_dir = TempDir::new().unwrap();
        let mut backend = MockBackend::new();
        backend.expect_generate_content().times(0);

        let mut session = session_with(backend, MockAudioOutput::new(), &temp_dir);
        session.set_busy(true);

        let result = session.generate("Hello");
        assert!(matches!(result.unwrap_err(), SessionError::Busy));
        assert!(session.history().is_empty());
        assert!(session.is_busy());
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let long = "a".repeat(150);
        let short = preview(&long);
        assert_eq!(short.chars().count(), PREVIEW_CHARS + 3);
        assert!(short.ends_with("..."));

        let exact = "é".repeat(100);
        assert_eq!(preview(&exact), exact);
    }

    // ===========================================
    // Reference audio
    // ===========================================

    #[test]
    fn test_oversized_reference_leaves_state_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = session_with(MockBackend::new(), MockAudioOutput::new(), &temp_dir);

        let path = temp_dir.path().join("huge.wav");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(10 * 1024 * 1024 + 1).unwrap();

        let err = session.attach_reference(&path).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Synthesis(SynthesisError::OversizedFile { .. })
        ));
        assert!(session.config().reference.is_none());
        assert!(session.last_error().is_some());
    }

    #[test]
    fn test_attach_and_remove_reference() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = session_with(MockBackend::new(), MockAudioOutput::new(), &temp_dir);

        let path = temp_dir.path().join("me.ogg");
        std::fs::write(&path, b"OggS fake").unwrap();

        session.attach_reference(&path).unwrap();
        let reference = session.config().reference.clone().unwrap();
        assert_eq!(reference.mime_type, "audio/ogg");
        assert_eq!(reference.file_name, "me.ogg");

        session.remove_reference();
        assert!(session.config().reference.is_none());
    }

    // ===========================================
    // History operations
    // ===========================================

    #[test]
    fn test_clear_history_releases_every_handle() {
        let temp_dir = TempDir::new().unwrap();
        let mut backend = MockBackend::new();
        backend
            .expect_generate_content()
            .times(3)
            .returning(|_, _, _| Ok(audio_response()));

        let mut output = counting_output();
        output.expect_release().times(3).return_const(());

        let mut session = session_with(backend, output, &temp_dir);
        for text in ["one", "two", "three"] {
            session.generate(text).unwrap();
        }
        assert!(session.active().is_some());

        session.clear_history();

        assert!(session.history().is_empty());
        assert!(session.active().is_none());
    }

    #[test]
    fn test_play_from_history_sets_active() {
        let temp_dir = TempDir::new().unwrap();
        let mut backend = MockBackend::new();
        backend
            .expect_generate_content()
            .returning(|_, _, _| Ok(audio_response()));

        let mut session = session_with(backend, counting_output(), &temp_dir);
        let older = session.generate("older").unwrap().id;
        session.generate("newer").unwrap();

        session.play(older).unwrap();
        assert_eq!(session.active().unwrap().id, older);

        let missing = uuid::Uuid::new_v4();
        assert!(matches!(
            session.play(missing).unwrap_err(),
            SessionError::UnknownEntry(_)
        ));
    }

    #[test]
    fn test_export_names_file_after_id() {
        let temp_dir = TempDir::new().unwrap();
        let mut backend = MockBackend::new();
        backend
            .expect_generate_content()
            .returning(|_, _, _| Ok(audio_response()));

        let mut session = session_with(backend, counting_output(), &temp_dir);
        let entry = session.generate("Save me").unwrap();
        let id = entry.id;
        let expected_name = format!("echovocal-{}.wav", &id.to_string()[..8]);
        assert_eq!(entry.file_name(), expected_name);

        let path = session.export(id, temp_dir.path()).unwrap();
        assert_eq!(path, temp_dir.path().join(&expected_name));

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");

        let explicit = temp_dir.path().join("named.wav");
        let path = session.export(id, &explicit).unwrap();
        assert_eq!(path, explicit);
    }

    // ===========================================
    // SessionAudio
    // ===========================================

    #[test]
    fn test_session_audio_register_and_release() {
        let mut audio = SessionAudio::new(None).unwrap();
        assert!(!audio.has_player());

        let handle = audio.register(b"RIFF data").unwrap();
        assert!(handle.path().starts_with(audio.dir()));
        assert_eq!(std::fs::read(handle.path()).unwrap(), b"RIFF data");

        // Without a player, play is a no-op
        audio.play(&handle, 1.0).unwrap();

        audio.release(&handle);
        assert!(!handle.path().exists());
    }

    #[test]
    fn test_session_audio_rejects_bad_player_command() {
        let result = SessionAudio::new(Some("mpv 'unterminated"));
        assert!(matches!(
            result.err().unwrap(),
            PlaybackError::InvalidPlayer(_)
        ));
    }

    #[test]
    fn test_player_args_substitution() {
        let template = vec!["mpv".to_string(), "--speed={rate}".to_string()];
        let args = player_args(&template, Path::new("/tmp/a.wav"), 1.5);
        assert_eq!(args, vec!["mpv", "--speed=1.5", "/tmp/a.wav"]);

        let template = vec![
            "play".to_string(),
            "{path}".to_string(),
            "tempo".to_string(),
            "{rate}".to_string(),
        ];
        let args = player_args(&template, Path::new("/tmp/b.wav"), 1.0);
        assert_eq!(args, vec!["play", "/tmp/b.wav", "tempo", "1"]);
    }
}
