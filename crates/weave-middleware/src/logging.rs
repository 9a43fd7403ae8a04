use std::borrow::Cow;

use tracing::Level;
use weave_core::{Advice, Arguments, MethodDescriptor, Outcome, Result, Target};

/// 按运行期级别输出事件；`tracing` 宏要求级别为常量，因此逐级展开。
macro_rules! emit {
    ($level:expr, $($rest:tt)+) => {
        match $level {
            Level::ERROR => tracing::error!(target: "weave::logging", $($rest)+),
            Level::WARN => tracing::warn!(target: "weave::logging", $($rest)+),
            Level::INFO => tracing::info!(target: "weave::logging", $($rest)+),
            Level::DEBUG => tracing::debug!(target: "weave::logging", $($rest)+),
            _ => tracing::trace!(target: "weave::logging", $($rest)+),
        }
    };
}

/// 日志 Advice 的配置。
///
/// # 教案式说明
/// - **意图（Why）**：同一 Advice 常被注册到多个标记上，`label` 用于在日志中区分来源；
///   `level` 控制正常调用的输出级别；
/// - **契约（What）**：
///   - `label`：低基数字符串，作为每条日志的 `label` 字段；
///   - `level`：调用开始与成功结束时使用的级别；
///   - `failure_level`：调用失败时使用的级别，默认 `WARN`；
///   - `log_arguments`：是否以 `Debug` 形式输出参数与返回值，参数含敏感数据时应关闭。
/// - **风险提示（Trade-offs）**：高频方法使用 `INFO` 可能造成日志风暴。
#[derive(Clone, Debug)]
pub struct LoggingAdviceConfig {
    pub label: Cow<'static, str>,
    pub level: Level,
    pub failure_level: Level,
    pub log_arguments: bool,
}

impl Default for LoggingAdviceConfig {
    fn default() -> Self {
        Self {
            label: Cow::Borrowed("logging"),
            level: Level::INFO,
            failure_level: Level::WARN,
            log_arguments: true,
        }
    }
}

/// 在调用前后输出结构化日志的 Advice。
///
/// # 教案式说明
/// - **意图（Why）**：统一记录被标记方法的进入与退出，替代在业务方法内手写日志；
/// - **结构（How）**：`before` 输出 `call started`，`after` 依据结果输出 `call finished` 或
///   `call failed`；字段包含 `label`、`method`（`接口::方法`）与 `delegate`；
/// - **契约（What）**：Advice 自身从不失败，不会影响调用结果。
#[derive(Clone, Debug, Default)]
pub struct LoggingAdvice {
    config: LoggingAdviceConfig,
}

impl LoggingAdvice {
    pub fn new(config: LoggingAdviceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoggingAdviceConfig {
        &self.config
    }
}

impl Advice for LoggingAdvice {
    fn before(&self, target: &dyn Target, method: &MethodDescriptor, args: &Arguments) -> Result<()> {
        let label = self.config.label.as_ref();
        let method = method.qualified_name();
        let delegate = target.type_name();
        if self.config.log_arguments {
            emit!(self.config.level, label, %method, delegate, ?args, "call started");
        } else {
            emit!(self.config.level, label, %method, delegate, arity = args.len(), "call started");
        }
        Ok(())
    }

    fn after(
        &self,
        target: &dyn Target,
        method: &MethodDescriptor,
        _args: &Arguments,
        outcome: Outcome<'_>,
    ) -> Result<()> {
        let label = self.config.label.as_ref();
        let method = method.qualified_name();
        let delegate = target.type_name();
        match outcome {
            Ok(value) if self.config.log_arguments => {
                emit!(self.config.level, label, %method, delegate, result = ?value, "call finished");
            }
            Ok(_) => {
                emit!(self.config.level, label, %method, delegate, "call finished");
            }
            Err(error) => {
                emit!(self.config.failure_level, label, %method, delegate, %error, "call failed");
            }
        }
        Ok(())
    }
}
