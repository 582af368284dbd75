//! 提示词模块
//!
//! 按语言组装系统提示词与增强后的用户消息。所有面向用户的文案
//! 均按语言逐条编写，不做运行时翻译。
//!
//! 检索到的历史对话属于不可信文本，只会以 `<relevant_context>` 包裹后
//! 并入*用户*消息；系统提示词只填充用户信息行，绝不包含检索内容。

use crate::language::Language;
use crate::memory::ContextHit;
use crate::models::User;

/// 中文系统提示词
const SYSTEM_PROMPT_ZH: &str = "你是暖洋洋，一个专门陪伴老年人的智能助手。

## 你的角色定位
- 身份：晚辈、朋友、倾听者
- 性格：温暖、耐心、善解人意
- 语气：亲切、口语化、不说教

## 对话原则
1. 使用简单、通俗的语言，避免专业术语
2. 回复简短（2-3句话），避免长篇大论
3. 多提开放式问题，鼓励老人表达
4. 对老人的感受表示理解和认同
5. 适时给予鼓励和肯定

## 禁止事项
- 不提供医疗诊断或治疗建议
- 不推荐具体药物
- 不对严重症状轻描淡写

## 用户信息
{user_info}
";

/// 荷兰语系统提示词
const SYSTEM_PROMPT_NL: &str = "Je bent Nuanyangyang, een slimme assistent die speciaal is ontworpen om ouderen gezelschap te houden.

## Jouw rol
- Identiteit: Jongere familielid, vriend, luisteraar
- Persoonlijkheid: Warm, geduldig, begripvol
- Toon: Vriendelijk, conversationeel, niet betuttelend

## Gespreksregels
1. Gebruik eenvoudige, alledaagse taal, vermijd jargon
2. Houd antwoorden kort (2-3 zinnen), vermijd lange uitleg
3. Stel open vragen om de oudere aan te moedigen te praten
4. Toon begrip en bevestiging voor hun gevoelens
5. Geef op het juiste moment aanmoediging en complimenten

## Verboden
- Geef geen medische diagnoses of behandeladvies
- Raad geen specifieke medicijnen aan
- Bagatelliseer geen ernstige symptomen

## Gebruikersinformatie
{user_info}
";

/// 英语系统提示词
const SYSTEM_PROMPT_EN: &str = "You are Nuanyangyang, a smart assistant specially designed to keep elderly people company.

## Your Role
- Identity: Younger family member, friend, listener
- Personality: Warm, patient, empathetic
- Tone: Friendly, conversational, non-patronizing

## Conversation Principles
1. Use simple, everyday language, avoid jargon
2. Keep responses short (2-3 sentences), avoid lengthy explanations
3. Ask open-ended questions to encourage the elderly to express themselves
4. Show understanding and validation for their feelings
5. Provide encouragement and affirmation at appropriate times

## Prohibitions
- Do not provide medical diagnoses or treatment advice
- Do not recommend specific medications
- Do not downplay serious symptoms

## User information
{user_info}
";

/// 道歉话术类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApologyKind {
    /// 后端凭证未配置
    Configuration,
    /// 模型调用失败
    Upstream,
}

/// 组装完成的提示词
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPrompt {
    /// 系统提示词（只含用户信息，不含检索内容）
    pub system_prompt: String,
    /// 增强后的用户消息
    pub user_message: String,
}

/// 提示词组装器
#[derive(Debug, Clone, Default)]
pub struct PromptComposer;

impl PromptComposer {
    pub fn new() -> Self {
        Self
    }

    /// 生成用户信息行
    pub fn user_info_line(&self, language: Language, profile: Option<&User>) -> String {
        match profile {
            Some(user) => match language {
                Language::Zh => format!("姓名: {}, 年龄: {}", user.name, user.age),
                Language::Nl => format!("Naam: {}, Leeftijd: {}", user.name, user.age),
                Language::En => format!("Name: {}, Age: {}", user.name, user.age),
            },
            None => match language {
                Language::Zh => "新用户".to_string(),
                Language::Nl => "Nieuwe gebruiker".to_string(),
                Language::En => "New user".to_string(),
            },
        }
    }

    /// 组装系统提示词和增强后的用户消息
    pub fn compose(
        &self,
        language: Language,
        profile: Option<&User>,
        retrieved: &[ContextHit],
        raw_message: &str,
    ) -> ComposedPrompt {
        let user_info = self.user_info_line(language, profile);
        let system_prompt = system_prompt_template(language).replace("{user_info}", &user_info);

        let user_message = if retrieved.is_empty() {
            raw_message.to_string()
        } else {
            let context_text = retrieved
                .iter()
                .map(|hit| format!("<conversation>\n{}\n</conversation>", hit.text))
                .collect::<Vec<_>>()
                .join("\n");

            let instruction = match language {
                Language::Zh => "请根据上述相关上下文（如果有用的话）回答用户的问题：",
                Language::Nl => {
                    "Beantwoord de vraag van de gebruiker op basis van de bovenstaande context (indien relevant):"
                }
                Language::En => {
                    "Answer the user's question based on the relevant context above (if applicable):"
                }
            };

            format!(
                "<relevant_context>\n{context_text}\n</relevant_context>\n\n{instruction}\n{raw_message}"
            )
        };

        ComposedPrompt {
            system_prompt,
            user_message,
        }
    }

    /// 模型调用失败时返回给用户的道歉话术
    pub fn apology(&self, language: Language, kind: ApologyKind) -> &'static str {
        match (language, kind) {
            (Language::Zh, ApologyKind::Configuration) => {
                "抱歉，这个语言的服务还没有配置好，您可以先用中文和我聊天。"
            }
            (Language::Nl, ApologyKind::Configuration) => {
                "Sorry, deze taal is nog niet ingesteld. U kunt voorlopig in het Chinees met mij praten."
            }
            (Language::En, ApologyKind::Configuration) => {
                "Sorry, this language has not been set up yet. You can still chat with me in Chinese for now."
            }
            (Language::Zh, ApologyKind::Upstream) => {
                "抱歉，我这边出了点小问题，请稍后再试试好吗？"
            }
            (Language::Nl, ApologyKind::Upstream) => {
                "Sorry, er ging even iets mis aan mijn kant. Wilt u het zo nog eens proberen?"
            }
            (Language::En, ApologyKind::Upstream) => {
                "Sorry, something went wrong on my side. Could you try again in a moment?"
            }
        }
    }
}

/// 每种语言的静态系统提示词模板
fn system_prompt_template(language: Language) -> &'static str {
    match language {
        Language::Zh => SYSTEM_PROMPT_ZH,
        Language::Nl => SYSTEM_PROMPT_NL,
        Language::En => SYSTEM_PROMPT_EN,
    }
}
