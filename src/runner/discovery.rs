//! 测试发现：遍历测试目录，按文件名模式匹配，映射到已注册的模块

use super::registry::{TestCaseClass, TestRegistry};
use crate::error::{DiscoveryError, Result};
use glob::Pattern;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// 发现得到的一个测试用例类型
#[derive(Clone)]
pub struct SuiteCase {
    pub module: String,
    /// 匹配到的测试文件
    pub path: PathBuf,
    pub class: Arc<dyn TestCaseClass>,
}

impl fmt::Debug for SuiteCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteCase")
            .field("module", &self.module)
            .field("path", &self.path)
            .field("class", &self.class.class_name())
            .finish()
    }
}

/// 按发现顺序排列的测试用例集合
#[derive(Clone, Default)]
pub struct TestSuite {
    cases: Vec<SuiteCase>,
}

impl TestSuite {
    pub fn new(cases: Vec<SuiteCase>) -> Self {
        Self { cases }
    }

    /// 测试方法总数
    pub fn count_test_cases(&self) -> usize {
        self.cases.iter().map(|c| c.class.method_names().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.count_test_cases() == 0
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SuiteCase> {
        self.cases.iter()
    }

    /// 涉及的模块名（去重，按发现顺序）
    pub fn modules(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.cases
            .iter()
            .map(|c| c.module.as_str())
            .filter(|m| seen.insert(*m))
            .collect()
    }
}

impl fmt::Debug for TestSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.cases).finish()
    }
}

/// 遍历 `test_dir`（按文件名排序），收集匹配 `pattern` 且已注册的模块
pub(crate) fn discover(registry: &TestRegistry, test_dir: &Path, pattern: &str) -> Result<TestSuite> {
    if !test_dir.exists() {
        return Err(DiscoveryError::NotFound(test_dir.to_path_buf()).into());
    }
    if !test_dir.is_dir() {
        return Err(DiscoveryError::NotADirectory(test_dir.to_path_buf()).into());
    }
    let matcher = Pattern::new(pattern).map_err(|e| DiscoveryError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    let mut cases = Vec::new();
    let mut seen_modules = HashSet::new();

    for entry in WalkDir::new(test_dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| DiscoveryError::Walk {
            path: e.path().unwrap_or(test_dir).to_path_buf(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        if !matcher.matches(&file_name) {
            continue;
        }
        let Some(stem) = entry.path().file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };

        let Some(module) = registry.module(&stem) else {
            warn!(file = %entry.path().display(), "测试文件没有对应的注册模块，已跳过");
            continue;
        };
        if !seen_modules.insert(stem.clone()) {
            warn!(file = %entry.path().display(), module = %stem, "模块已由其他文件匹配，已跳过");
            continue;
        }

        debug!(module = %stem, classes = module.classes.len(), "发现测试模块");
        cases.extend(module.classes.iter().map(|class| SuiteCase {
            module: stem.clone(),
            path: entry.path().to_path_buf(),
            class: class.clone(),
        }));
    }

    let suite = TestSuite::new(cases);
    info!(
        dir = %test_dir.display(),
        pattern,
        modules = seen_modules.len(),
        tests = suite.count_test_cases(),
        "测试发现完成"
    );
    Ok(suite)
}
