use std::str::FromStr;

use color_eyre::{
    eyre::{bail, WrapErr},
    Result,
};
use prefvault_core::{
    prefs::{PrefKind, PreferenceStore},
    vault::SecretVault,
};
use prefvault_storage::encrypted_store::EncryptedPrefs;
use tracing::warn;

use crate::cli::{GetArgs, KindArg, SetArgs};

/// Read an entry and render it for display; `None` when it is not set.
pub async fn get<V, S>(prefs: &EncryptedPrefs<V, S>, args: &GetArgs) -> Result<Option<String>>
where
    V: SecretVault,
    S: PreferenceStore,
{
    let name = args.name.as_str();
    let rendered = match args.kind {
        KindArg::Text => prefs.get_string(name, args.no_crypt).await?,
        KindArg::List => prefs
            .get_string_list(name, args.no_crypt)
            .await?
            .map(|values| values.join("\n")),
        KindArg::Bool => prefs.get_bool(name).await?.map(|v| v.to_string()),
        KindArg::Int => prefs.get_int(name).await?.map(|v| v.to_string()),
        KindArg::Double => prefs.get_double(name).await?.map(|v| v.to_string()),
    };
    Ok(rendered)
}

/// Write an entry, parsing the value according to its kind.
pub async fn set<V, S>(prefs: &EncryptedPrefs<V, S>, args: &SetArgs) -> Result<()>
where
    V: SecretVault,
    S: PreferenceStore,
{
    let name = args.name.as_str();
    if args.no_crypt && !matches!(args.kind, KindArg::Text | KindArg::List) {
        warn!(entry = name, "--no-crypt has no effect on {:?} entries", args.kind);
    }

    match args.kind {
        KindArg::List => prefs.set_string_list(name, &args.values, args.no_crypt).await?,
        KindArg::Text => {
            prefs
                .set_string(name, single_value(args)?, args.no_crypt)
                .await?
        }
        KindArg::Bool => prefs.set_bool(name, parse(single_value(args)?)?).await?,
        KindArg::Int => prefs.set_int(name, parse(single_value(args)?)?).await?,
        KindArg::Double => prefs.set_double(name, parse(single_value(args)?)?).await?,
    }
    Ok(())
}

/// All stored names with their kinds.
pub async fn list<V, S>(prefs: &EncryptedPrefs<V, S>) -> Result<Vec<(String, PrefKind)>>
where
    V: SecretVault,
    S: PreferenceStore,
{
    let mut entries = Vec::new();
    for name in prefs.keys().await? {
        if let Some(kind) = prefs.kind_of(&name).await? {
            entries.push((name, kind));
        }
    }
    Ok(entries)
}

fn single_value(args: &SetArgs) -> Result<&str> {
    match args.values.as_slice() {
        [value] => Ok(value.as_str()),
        values => bail!(
            "expected exactly one value for a {:?} entry, got {}",
            args.kind,
            values.len()
        ),
    }
}

fn parse<T>(value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .wrap_err_with(|| format!("invalid value {value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage;

    fn get_args(name: &str, kind: KindArg, no_crypt: bool) -> GetArgs {
        GetArgs {
            name: name.into(),
            kind,
            no_crypt,
        }
    }

    fn set_args(name: &str, values: &[&str], kind: KindArg, no_crypt: bool) -> SetArgs {
        SetArgs {
            name: name.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
            kind,
            no_crypt,
        }
    }

    #[tokio::test]
    async fn set_then_get_each_kind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefs = storage::test_prefs(dir.path());

        set(&prefs, &set_args("token", &["abc"], KindArg::Text, false))
            .await
            .expect("set text");
        set(&prefs, &set_args("hosts", &["a", "b"], KindArg::List, false))
            .await
            .expect("set list");
        set(&prefs, &set_args("on", &["true"], KindArg::Bool, false))
            .await
            .expect("set bool");
        set(&prefs, &set_args("n", &["-4"], KindArg::Int, false))
            .await
            .expect("set int");
        set(&prefs, &set_args("x", &["2.5"], KindArg::Double, false))
            .await
            .expect("set double");

        let read = |name: &'static str, kind| get_args(name, kind, false);
        assert_eq!(
            get(&prefs, &read("token", KindArg::Text)).await.unwrap(),
            Some("abc".into())
        );
        assert_eq!(
            get(&prefs, &read("hosts", KindArg::List)).await.unwrap(),
            Some("a\nb".into())
        );
        assert_eq!(
            get(&prefs, &read("on", KindArg::Bool)).await.unwrap(),
            Some("true".into())
        );
        assert_eq!(
            get(&prefs, &read("n", KindArg::Int)).await.unwrap(),
            Some("-4".into())
        );
        assert_eq!(
            get(&prefs, &read("x", KindArg::Double)).await.unwrap(),
            Some("2.5".into())
        );
        assert_eq!(
            get(&prefs, &read("missing", KindArg::Text)).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn no_crypt_text_is_readable_in_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefs = storage::test_prefs(dir.path());

        set(&prefs, &set_args("theme", &["dark"], KindArg::Text, true))
            .await
            .expect("set");
        set(&prefs, &set_args("token", &["hunter2"], KindArg::Text, false))
            .await
            .expect("set");

        let raw = std::fs::read_to_string(prefs.store().path()).expect("read file");
        assert!(raw.contains("\"dark\""));
        assert!(!raw.contains("hunter2"), "plaintext must not be stored");
    }

    #[tokio::test]
    async fn rejects_bad_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefs = storage::test_prefs(dir.path());

        assert!(set(&prefs, &set_args("n", &["four"], KindArg::Int, false))
            .await
            .is_err());
        assert!(set(&prefs, &set_args("t", &["a", "b"], KindArg::Text, false))
            .await
            .is_err());
        assert!(list(&prefs).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn lists_names_with_kinds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefs = storage::test_prefs(dir.path());
        set(&prefs, &set_args("b", &["1"], KindArg::Int, false))
            .await
            .expect("set");
        set(&prefs, &set_args("a", &["v"], KindArg::Text, false))
            .await
            .expect("set");

        assert_eq!(
            list(&prefs).await.expect("list"),
            vec![
                ("a".to_string(), PrefKind::OpaqueText),
                ("b".to_string(), PrefKind::Integer)
            ]
        );
    }
}
