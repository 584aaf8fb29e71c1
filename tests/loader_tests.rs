//! Integration tests for cached dictionary loading and default-locale fallback.

use std::sync::Arc;

use anyhow::{Context, Result, ensure};
use kotoba::dictionary::{
    DictionaryCache, DictionaryError, DictionaryLoader, DirectorySource, EmbeddedSource,
    SourceError,
};
use kotoba::locale::LocaleRegistry;
use kotoba::translate::translate;
use rstest::{fixture, rstest};
use test_support::{CountingSource, DictionaryDir, EN_FIXTURE, ES_FIXTURE, GatedSource};

type Counting = Arc<CountingSource<EmbeddedSource>>;

#[fixture]
fn registry() -> Arc<LocaleRegistry> {
    Arc::new(LocaleRegistry::builtin())
}

fn counting(source: EmbeddedSource) -> Counting {
    Arc::new(CountingSource::new(source))
}

fn loader_over(
    registry: Arc<LocaleRegistry>,
    source: &Counting,
) -> DictionaryLoader<Counting> {
    DictionaryLoader::new(registry, Arc::clone(source), Arc::new(DictionaryCache::new()))
}

fn both_locales() -> EmbeddedSource {
    EmbeddedSource::new()
        .with_resource("en", EN_FIXTURE)
        .with_resource("es", ES_FIXTURE)
}

#[rstest]
#[case("en")]
#[case("es")]
#[tokio::test]
async fn repeated_requests_load_once(registry: Arc<LocaleRegistry>, #[case] locale: &str) -> Result<()> {
    let source = counting(both_locales());
    let loader = loader_over(registry, &source);

    let first = loader.get(locale).await.context("first load")?;
    let second = loader.get(locale).await.context("second load")?;

    ensure!(first.ptr_eq(&second), "expected the cached dictionary to be shared");
    ensure!(first == second, "expected identical content");
    ensure!(first.locale() == locale, "served {} for {locale}", first.locale());
    ensure!(
        source.loads(locale) == 1,
        "expected one load for {locale}, saw {}",
        source.loads(locale)
    );
    Ok(())
}

#[rstest]
#[tokio::test]
async fn concurrent_callers_share_the_in_flight_load(registry: Arc<LocaleRegistry>) -> Result<()> {
    let source = Arc::new(GatedSource::new(both_locales()));
    let cache = Arc::new(DictionaryCache::new());
    let loader = DictionaryLoader::new(registry, Arc::clone(&source), Arc::clone(&cache));

    let (first, second, observed) = tokio::join!(loader.get("es"), loader.get("es"), async {
        tokio::task::yield_now().await;
        let observed = (cache.contains("es"), cache.is_settled("es"), source.loads("es"));
        source.open();
        observed
    });

    ensure!(
        observed == (true, false, 1),
        "expected one pending load while both callers waited, got {observed:?}"
    );
    let first_dictionary = first.context("first caller")?;
    let second_dictionary = second.context("second caller")?;
    ensure!(
        first_dictionary.ptr_eq(&second_dictionary),
        "callers observed different loads"
    );
    ensure!(source.total() == 1, "expected a single load, saw {}", source.total());
    ensure!(cache.is_settled("es"), "load should be settled after completion");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn tasks_on_many_threads_share_one_load(registry: Arc<LocaleRegistry>) -> Result<()> {
    let source = Arc::new(GatedSource::new(both_locales()));
    let loader = Arc::new(DictionaryLoader::new(
        registry,
        Arc::clone(&source),
        Arc::new(DictionaryCache::new()),
    ));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let task_loader = Arc::clone(&loader);
            tokio::spawn(async move { task_loader.get("en").await })
        })
        .collect();
    while source.total() == 0 {
        tokio::task::yield_now().await;
    }
    source.open();

    let mut dictionaries = Vec::new();
    for handle in handles {
        dictionaries.push(handle.await.context("join loader task")?.context("load en")?);
    }
    let Some((head, rest)) = dictionaries.split_first() else {
        anyhow::bail!("no dictionaries returned");
    };
    ensure!(
        rest.iter().all(|dictionary| dictionary.ptr_eq(head)),
        "tasks observed different loads"
    );
    ensure!(source.loads("en") == 1, "expected one load, saw {}", source.loads("en"));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn dropped_caller_leaves_the_load_to_the_next(registry: Arc<LocaleRegistry>) -> Result<()> {
    let source = Arc::new(GatedSource::new(both_locales()));
    let loader = Arc::new(DictionaryLoader::new(
        registry,
        Arc::clone(&source),
        Arc::new(DictionaryCache::new()),
    ));

    let first_loader = Arc::clone(&loader);
    let first = tokio::spawn(async move { first_loader.get("en").await });
    while source.total() == 0 {
        tokio::task::yield_now().await;
    }
    first.abort();
    let aborted = first.await;
    ensure!(
        aborted.as_ref().is_err_and(tokio::task::JoinError::is_cancelled),
        "first caller should have been cancelled, got {aborted:?}"
    );
    ensure!(!loader.cache().is_settled("en"), "load finished before the gate opened");

    source.open();
    let dictionary = loader.get("en").await.context("second caller")?;
    ensure!(dictionary.locale() == "en", "served {}", dictionary.locale());
    ensure!(source.loads("en") == 1, "load restarted: {} loads", source.loads("en"));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn fallback_settles_the_default(registry: Arc<LocaleRegistry>) -> Result<()> {
    let source = counting(EmbeddedSource::new().with_resource("en", EN_FIXTURE));
    let loader = loader_over(registry, &source);

    ensure!(!loader.cache().is_settled("en"), "nothing requested yet");
    loader.get("es").await.context("fallback load")?;
    ensure!(loader.cache().is_settled("es"), "failed load should be settled");
    ensure!(
        loader.cache().is_settled("en"),
        "default loaded through fallback should be settled"
    );
    Ok(())
}

#[rstest]
#[case::registered_but_missing("es")]
#[case::unregistered("fr")]
#[case::unsafe_name("../en")]
#[tokio::test]
async fn failed_locales_fall_back_to_the_cached_default(
    registry: Arc<LocaleRegistry>,
    #[case] locale: &str,
) -> Result<()> {
    let source = counting(EmbeddedSource::new().with_resource("en", EN_FIXTURE));
    let loader = loader_over(registry, &source);

    let fallback = loader.get(locale).await.context("fallback load")?;
    ensure!(fallback.locale() == "en", "expected English, got {}", fallback.locale());
    ensure!(translate(&fallback, "home.welcome") == "Hi", "unexpected content");

    let again = loader.get(locale).await.context("repeated fallback")?;
    let default = loader.get("en").await.context("default load")?;
    ensure!(again.ptr_eq(&fallback), "repeated fallback was not cached");
    ensure!(default.ptr_eq(&fallback), "fallback did not reuse the default load");
    ensure!(source.loads(locale) == 1, "requested locale reloaded");
    ensure!(source.loads("en") == 1, "default reloaded: {}", source.loads("en"));
    ensure!(loader.cache().contains(locale), "failed locale should stay cached");
    Ok(())
}

#[rstest]
#[tokio::test]
async fn malformed_resources_fall_back(registry: Arc<LocaleRegistry>) -> Result<()> {
    let source = counting(
        EmbeddedSource::new()
            .with_resource("en", EN_FIXTURE)
            .with_resource("es", r#"{"home": {"welcome": "Hola""#),
    );
    let loader = loader_over(registry, &source);

    let dictionary = loader.get("es").await.context("load es")?;
    ensure!(dictionary.locale() == "en", "malformed es should fall back to en");
    Ok(())
}

#[rstest]
#[tokio::test]
async fn missing_default_is_terminal_and_cached(registry: Arc<LocaleRegistry>) -> Result<()> {
    let source = counting(EmbeddedSource::new().with_resource("en", "[]"));
    let loader = loader_over(registry, &source);

    let direct = loader.get("en").await;
    ensure!(
        matches!(
            &direct,
            Err(DictionaryError::DefaultUnavailable { locale, source: cause })
                if *locale == "en" && matches!(**cause, SourceError::Malformed { .. })
        ),
        "expected terminal failure, got {direct:?}"
    );

    let via_fallback = loader.get("es").await;
    ensure!(
        matches!(via_fallback, Err(DictionaryError::DefaultUnavailable { .. })),
        "fallback to a broken default must fail, got {via_fallback:?}"
    );
    let repeated = loader.get("en").await;
    ensure!(repeated.is_err(), "terminal failure should be cached");
    ensure!(source.loads("en") == 1, "default reloaded: {}", source.loads("en"));
    ensure!(source.loads("es") == 1, "es reloaded: {}", source.loads("es"));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn separate_caches_load_independently(registry: Arc<LocaleRegistry>) -> Result<()> {
    let source = counting(both_locales());
    let first = loader_over(Arc::clone(&registry), &source);
    let second = loader_over(registry, &source);

    let from_first = first.get("en").await.context("first cache")?;
    let from_second = second.get("en").await.context("second cache")?;

    ensure!(!from_first.ptr_eq(&from_second), "caches leaked into each other");
    ensure!(source.loads("en") == 2, "expected one load per cache");
    Ok(())
}

#[rstest]
#[tokio::test]
async fn shared_cache_spans_loaders(registry: Arc<LocaleRegistry>) -> Result<()> {
    let source = counting(both_locales());
    let cache = Arc::new(DictionaryCache::new());
    let first = DictionaryLoader::new(Arc::clone(&registry), Arc::clone(&source), Arc::clone(&cache));
    let second = DictionaryLoader::new(registry, Arc::clone(&source), cache);

    let from_first = first.get("es").await.context("first loader")?;
    let from_second = second.get("es").await.context("second loader")?;

    ensure!(from_first.ptr_eq(&from_second), "shared cache was not reused");
    ensure!(source.loads("es") == 1, "expected a single load");
    Ok(())
}

#[rstest]
#[tokio::test]
async fn directory_source_reads_json_files(registry: Arc<LocaleRegistry>) -> Result<()> {
    let dir = DictionaryDir::new()?;
    dir.write("en", EN_FIXTURE)?.write("es", ES_FIXTURE)?;
    let loader = DictionaryLoader::new(
        registry,
        DirectorySource::new(dir.path()),
        Arc::new(DictionaryCache::new()),
    );

    let spanish = loader.get("es").await.context("load es from disk")?;
    ensure!(translate(&spanish, "home.welcome") == "Hola", "unexpected Spanish content");

    let missing = loader.get("de").await.context("load de from disk")?;
    ensure!(missing.locale() == "en", "absent file should fall back to en");
    Ok(())
}
