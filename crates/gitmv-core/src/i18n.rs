//! Message catalog: the wording of every notice, question, and choice.
//!
//! A [`Catalog`] is built once from the operator's language preference and
//! passed to whichever front end renders output. There is no global state.

use crate::narrate::Notice;
use crate::prompt::{Choice, Question};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ko,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Ko];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ko => "ko",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "ko" | "korean" => Ok(Language::Ko),
            other => Err(format!("unsupported language '{other}' (expected en or ko)")),
        }
    }
}

/// Fixed UI strings that are not tied to a notice or question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    SelectNumber,
    InvalidSelection,
    MultiSelectHint,
    Yes,
    BranchColumn,
    StatusColumn,
    ConflictsColumn,
    ErrorPrefix,
    WarningPrefix,
}

/// Human-readable size with a 1024 base, e.g. `1.5 KB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Catalog {
    language: Language,
}

impl Catalog {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn label(&self, label: Label) -> &'static str {
        use Label::*;
        match (self.language, label) {
            (Language::En, SelectNumber) => "Select (number): ",
            (Language::Ko, SelectNumber) => "선택 (번호): ",
            (Language::En, InvalidSelection) => "Invalid selection, please try again.",
            (Language::Ko, InvalidSelection) => "잘못된 선택입니다. 다시 시도하세요.",
            (Language::En, MultiSelectHint) => {
                "Enter numbers separated by comma (e.g. 1,3,5), \"all\", or press Enter for the marked defaults:"
            }
            (Language::Ko, MultiSelectHint) => {
                "쉼표로 구분된 번호(예: 1,3,5) 또는 \"all\"을 입력하세요. Enter는 표시된 기본값을 선택합니다:"
            }
            (Language::En, Yes) => "y",
            (Language::Ko, Yes) => "y",
            (Language::En, BranchColumn) => "Branch",
            (Language::Ko, BranchColumn) => "브랜치",
            (Language::En, StatusColumn) => "Status",
            (Language::Ko, StatusColumn) => "상태",
            (Language::En, ConflictsColumn) => "Conflicts",
            (Language::Ko, ConflictsColumn) => "충돌",
            (Language::En, ErrorPrefix) => "Error",
            (Language::Ko, ErrorPrefix) => "오류",
            (Language::En, WarningPrefix) => "Warning",
            (Language::Ko, WarningPrefix) => "경고",
        }
    }

    pub fn choice(&self, choice: &Choice) -> String {
        let ko = self.language == Language::Ko;
        match choice {
            Choice::CreateAndCheckout if ko => "생성 후 체크아웃".into(),
            Choice::CreateAndCheckout => "Create and checkout".into(),
            Choice::Skip if ko => "건너뛰기".into(),
            Choice::Skip => "Skip".into(),
            Choice::KeepName if ko => "같은 이름 사용".into(),
            Choice::KeepName => "Keep the same name".into(),
            Choice::MapToExisting if ko => "기존 로컬 브랜치로 매핑".into(),
            Choice::MapToExisting => "Map to an existing local branch".into(),
            Choice::MapToNew if ko => "새 브랜치 이름으로 매핑".into(),
            Choice::MapToNew => "Map to a new branch name".into(),
            Choice::Branch(name) => name.clone(),
        }
    }

    pub fn question(&self, question: &Question) -> String {
        match self.language {
            Language::En => question_en(question),
            Language::Ko => question_ko(question),
        }
    }

    /// Render a notice. May span several lines.
    pub fn notice(&self, notice: &Notice) -> String {
        match self.language {
            Language::En => notice_en(notice),
            Language::Ko => notice_ko(notice),
        }
    }
}

fn question_en(q: &Question) -> String {
    match q {
        Question::ContinueWithDirtyTree => "Continue anyway?".into(),
        Question::ProceedWithExport => "Proceed with export?".into(),
        Question::SelectExportBranches => "Select branches to export:".into(),
        Question::UseInitMode => {
            "Use initial import mode? (faster and simpler for an empty repository)".into()
        }
        Question::SelectImportBranches => "Select branches to import:".into(),
        Question::CustomizeMapping => {
            "Map any incoming branch onto a different local branch name?".into()
        }
        Question::MapBranch { source } => format!("Incoming branch '{source}': where should it go?"),
        Question::ChooseExistingTarget { source } => {
            format!("Local branch to receive '{source}':")
        }
        Question::NewBranchName { source } => format!("New local branch name for '{source}': "),
        Question::MissingLocalBranch { branch } => {
            format!("Branch '{branch}' does not exist locally. What to do?")
        }
        Question::ConfirmMerge { remote_ref, branch } => {
            format!("Merge {remote_ref} into {branch}?")
        }
        Question::RetryUnrelated { branch } => format!(
            "'{branch}' shares no history with the incoming branch. Retry allowing unrelated histories?"
        ),
        Question::PushToRemote { url } => format!("Push changes to {url}?"),
    }
}

fn question_ko(q: &Question) -> String {
    match q {
        Question::ContinueWithDirtyTree => "그래도 계속하시겠습니까?".into(),
        Question::ProceedWithExport => "내보내기를 진행하시겠습니까?".into(),
        Question::SelectExportBranches => "내보낼 브랜치를 선택하세요:".into(),
        Question::UseInitMode => "최초 import 모드를 사용하시겠습니까? (더 빠르고 간단합니다)".into(),
        Question::SelectImportBranches => "가져올 브랜치를 선택하세요:".into(),
        Question::CustomizeMapping => "가져오는 브랜치를 다른 로컬 브랜치 이름으로 매핑하시겠습니까?".into(),
        Question::MapBranch { source } => format!("가져오는 브랜치 '{source}'를 어디에 반영할까요?"),
        Question::ChooseExistingTarget { source } => format!("'{source}'를 받을 로컬 브랜치:"),
        Question::NewBranchName { source } => format!("'{source}'의 새 로컬 브랜치 이름: "),
        Question::MissingLocalBranch { branch } => {
            format!("브랜치 '{branch}'가 로컬에 없습니다. 어떻게 할까요?")
        }
        Question::ConfirmMerge { remote_ref, branch } => {
            format!("{remote_ref}를 {branch}에 병합하시겠습니까?")
        }
        Question::RetryUnrelated { branch } => format!(
            "'{branch}'는 가져온 브랜치와 공통 이력이 없습니다. 관련 없는 이력 병합을 허용하여 다시 시도하시겠습니까?"
        ),
        Question::PushToRemote { url } => format!("{url}에 변경사항을 push 하시겠습니까?"),
    }
}

fn notice_en(n: &Notice) -> String {
    match n {
        Notice::DirtyTree => {
            "You have uncommitted changes. They will not be included in the export.".into()
        }
        Notice::RepositorySummary {
            current_branch,
            branch_count,
            tag_count,
        } => format!(
            "Repository Information:\n  Current Branch: {current_branch}\n  Total Branches: {branch_count}\n  Total Tags: {tag_count}"
        ),
        Notice::BranchListing {
            name,
            short_hash,
            active,
        } => listing(name, short_hash.as_deref(), *active, "no commit info"),
        Notice::CommitInfoUnavailable { reference } => {
            format!("Could not read commit info for {reference}; exporting it without details.")
        }
        Notice::BundleCreated { size } => format!("  Bundle size: {}", format_bytes(*size)),
        Notice::BundleVerified => "Bundle verified".into(),
        Notice::ExportComplete { path, size, sha256 } => format!(
            "Export Complete!\n  File: {}\n  Size: {}\n  SHA-256: {sha256}\n\nNext steps:\n  1. Copy this archive to the offline environment\n  2. Run: gitmv import <archive-path>",
            path.display(),
            format_bytes(*size)
        ),
        Notice::ExportCancelled => "Export cancelled.".into(),
        Notice::DryRun => "DRY-RUN MODE: no changes will be made".into(),
        Notice::ArchiveDigest { sha256 } => format!("Archive SHA-256: {sha256}"),
        Notice::EmptyRepository => "Empty repository detected: it has no commits yet.".into(),
        Notice::ModeSelected(crate::types::Mode::Init) => {
            "Initial import mode: branches are created directly from the bundle.".into()
        }
        Notice::ModeSelected(crate::types::Mode::Sync) => {
            "Sync mode: external changes are merged into existing branches.".into()
        }
        Notice::CurrentBranch(b) => format!("Current branch: {b}"),
        Notice::SnapshotSummary {
            export_date,
            original_branch,
            branch_count,
            tag_count,
        } => format!(
            "Exported Repository Information:\n  Export Date: {export_date}\n  Original Branch: {original_branch}\n  Total Branches: {branch_count}\n  Total Tags: {tag_count}"
        ),
        Notice::RemoteRegistered(name) => format!("Added temporary remote: {name}"),
        Notice::Fetched => "Fetched commits from bundle".into(),
        Notice::UnknownBranches(names) => {
            format!("Not in the archive, ignored: {}", names.join(", "))
        }
        Notice::NoBranchesSelected => "No branches selected".into(),
        Notice::BranchesToProcess(names) => format!("Branches to import: {}", names.join(", ")),
        Notice::BranchStart { source, target } if source == target => {
            format!("--- Processing branch: {source} ---")
        }
        Notice::BranchStart { source, target } => {
            format!("--- Processing branch: {source} -> {target} ---")
        }
        Notice::CommitDetails {
            short_hash,
            message,
            author,
        } => format!("  Latest commit: {short_hash}\n  Message: {message}\n  Author: {author}"),
        Notice::BranchCreated(b) => format!("Created branch: {b}"),
        Notice::WouldCreate(b) => format!("  [DRY-RUN] Would create branch: {b}"),
        Notice::WouldCheckout(b) => format!("  [DRY-RUN] Would checkout: {b}"),
        Notice::WouldMerge { remote_ref, branch } => {
            format!("  [DRY-RUN] Would merge: {remote_ref} into {branch}")
        }
        Notice::Merged(b) => format!("Merged successfully: {b}"),
        Notice::UnrelatedHistories(b) => {
            format!("Merge into '{b}' refused: the histories are unrelated.")
        }
        Notice::Skipped(b) => format!("  Skipped: {b}"),
        Notice::Conflict { branch, paths } => {
            let mut s = format!("Merge conflicts detected in branch: {branch}\n  Conflicted files:");
            for p in paths {
                s.push_str(&format!("\n    - {p}"));
            }
            s
        }
        Notice::ResolveInstructions => "Please resolve conflicts manually:\n  1. Edit conflicted files\n  2. git add <resolved-files>\n  3. git commit\n  4. Re-run the same import command".into(),
        Notice::Summary(_) => "=== Import Summary ===".into(),
        Notice::RemoteUrl(url) => format!("Remote URL: {url}"),
        Notice::PushFailed { branch, detail } => format!("Push of '{branch}' failed: {detail}"),
        Notice::Pushed => "Changes pushed.".into(),
        Notice::PushDeclined => {
            "Changes applied locally but not pushed. You can push manually later.".into()
        }
        Notice::NoOriginRemote => {
            "No remote \"origin\" configured. Changes applied locally only.".into()
        }
        Notice::CleanedUp => "Cleaned up temporary state".into(),
        Notice::ImportComplete { merged, created } => format!(
            "Import Complete!\n  Merged {merged} branches\n  Created {created} branches\n\nYour repository has been updated with external changes."
        ),
        Notice::DryRunComplete => {
            "Dry-Run Complete!\n  No actual changes were made.\n  Review the simulated actions above.".into()
        }
    }
}

fn notice_ko(n: &Notice) -> String {
    match n {
        Notice::DirtyTree => "커밋되지 않은 변경사항이 있습니다. 내보내기에 포함되지 않습니다.".into(),
        Notice::RepositorySummary {
            current_branch,
            branch_count,
            tag_count,
        } => format!(
            "저장소 정보:\n  현재 브랜치: {current_branch}\n  전체 브랜치: {branch_count}\n  전체 태그: {tag_count}"
        ),
        Notice::BranchListing {
            name,
            short_hash,
            active,
        } => listing(name, short_hash.as_deref(), *active, "커밋 정보 없음"),
        Notice::CommitInfoUnavailable { reference } => {
            format!("{reference}의 커밋 정보를 읽을 수 없어 정보 없이 내보냅니다.")
        }
        Notice::BundleCreated { size } => format!("  Bundle 크기: {}", format_bytes(*size)),
        Notice::BundleVerified => "Bundle 검증 완료".into(),
        Notice::ExportComplete { path, size, sha256 } => format!(
            "내보내기 완료!\n  파일: {}\n  크기: {}\n  SHA-256: {sha256}\n\n다음 단계:\n  1. 이 파일을 오프라인 환경으로 복사하세요\n  2. 실행: gitmv import <archive-path>",
            path.display(),
            format_bytes(*size)
        ),
        Notice::ExportCancelled => "내보내기가 취소되었습니다.".into(),
        Notice::DryRun => "DRY-RUN 모드: 실제 변경은 수행되지 않습니다".into(),
        Notice::ArchiveDigest { sha256 } => format!("아카이브 SHA-256: {sha256}"),
        Notice::EmptyRepository => "빈 저장소가 감지되었습니다. 이 저장소는 커밋이 없는 상태입니다.".into(),
        Notice::ModeSelected(crate::types::Mode::Init) => {
            "초기 Import 모드: Bundle에서 직접 브랜치를 생성합니다.".into()
        }
        Notice::ModeSelected(crate::types::Mode::Sync) => {
            "동기화 모드: 기존 브랜치에 외부 변경사항을 병합합니다.".into()
        }
        Notice::CurrentBranch(b) => format!("현재 브랜치: {b}"),
        Notice::SnapshotSummary {
            export_date,
            original_branch,
            branch_count,
            tag_count,
        } => format!(
            "내보낸 저장소 정보:\n  내보낸 날짜: {export_date}\n  원래 브랜치: {original_branch}\n  전체 브랜치: {branch_count}\n  전체 태그: {tag_count}"
        ),
        Notice::RemoteRegistered(name) => format!("임시 remote 추가: {name}"),
        Notice::Fetched => "Bundle에서 커밋을 가져왔습니다".into(),
        Notice::UnknownBranches(names) => {
            format!("아카이브에 없어 무시됨: {}", names.join(", "))
        }
        Notice::NoBranchesSelected => "선택된 브랜치가 없습니다".into(),
        Notice::BranchesToProcess(names) => format!("가져올 브랜치: {}", names.join(", ")),
        Notice::BranchStart { source, target } if source == target => {
            format!("--- 브랜치 처리 중: {source} ---")
        }
        Notice::BranchStart { source, target } => {
            format!("--- 브랜치 처리 중: {source} -> {target} ---")
        }
        Notice::CommitDetails {
            short_hash,
            message,
            author,
        } => format!("  최신 커밋: {short_hash}\n  메시지: {message}\n  작성자: {author}"),
        Notice::BranchCreated(b) => format!("브랜치 생성: {b}"),
        Notice::WouldCreate(b) => format!("  [DRY-RUN] 브랜치 생성 예정: {b}"),
        Notice::WouldCheckout(b) => format!("  [DRY-RUN] 체크아웃 예정: {b}"),
        Notice::WouldMerge { remote_ref, branch } => {
            format!("  [DRY-RUN] 병합 예정: {remote_ref} -> {branch}")
        }
        Notice::Merged(b) => format!("병합 성공: {b}"),
        Notice::UnrelatedHistories(b) => format!("'{b}' 병합 거부: 관련 없는 이력입니다."),
        Notice::Skipped(b) => format!("  건너뜀: {b}"),
        Notice::Conflict { branch, paths } => {
            let mut s = format!("브랜치에서 병합 충돌 발생: {branch}\n  충돌 파일:");
            for p in paths {
                s.push_str(&format!("\n    - {p}"));
            }
            s
        }
        Notice::ResolveInstructions => "충돌을 수동으로 해결하세요:\n  1. 충돌 파일 편집\n  2. git add <해결한 파일>\n  3. git commit\n  4. 같은 import 명령을 다시 실행".into(),
        Notice::Summary(_) => "=== Import 요약 ===".into(),
        Notice::RemoteUrl(url) => format!("Remote URL: {url}"),
        Notice::PushFailed { branch, detail } => format!("'{branch}' push 실패: {detail}"),
        Notice::Pushed => "변경사항을 push 했습니다.".into(),
        Notice::PushDeclined => {
            "변경사항이 로컬에만 반영되었습니다. 나중에 직접 push 할 수 있습니다.".into()
        }
        Notice::NoOriginRemote => "\"origin\" remote가 없습니다. 로컬에만 반영되었습니다.".into(),
        Notice::CleanedUp => "임시 상태 정리 완료".into(),
        Notice::ImportComplete { merged, created } => format!(
            "Import 완료!\n  병합된 브랜치: {merged}\n  생성된 브랜치: {created}\n\n외부 변경사항이 저장소에 반영되었습니다."
        ),
        Notice::DryRunComplete => {
            "Dry-Run 완료!\n  실제 변경은 없었습니다.\n  위의 시뮬레이션 결과를 확인하세요.".into()
        }
    }
}

fn listing(name: &str, short_hash: Option<&str>, active: bool, missing: &str) -> String {
    let marker = if active { "* " } else { "  " };
    match short_hash {
        Some(h) => format!("{marker}{name} ({h})"),
        None => format!("{marker}{name} ({missing})"),
    }
}
