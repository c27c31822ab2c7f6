//! Canned user-facing phrases. Where several phrasings exist, one is picked at
//! random per message to keep the conversation from sounding repetitive.

use rand::seq::IndexedRandom;

pub const GREETINGS: &[&str] = &[
    "Olá! Sou o assistente do curso de empreendedorismo da UVV, com mais de 50 anos de experiência em negócios, finanças, contabilidade e, claro, startups! 😉 Estou aqui para te guiar nessa jornada. Para começarmos, que tal me contar um pouco sobre você?",
    "Oi! Pronto para mergulhar no mundo do empreendedorismo? 😊 Sou um especialista em negócios, contabilidade, startups e finanças, com décadas de experiência. Antes de mais nada, gostaria de te conhecer melhor.",
    "Olá! Bem-vindo(a) ao curso de empreendedorismo da UVV! Sou o seu assistente, um especialista em ajudar jovens empreendedores como você a terem sucesso. Para personalizarmos o curso, preciso de algumas informações suas. 😉",
];

/// Templates with a `{question}` placeholder.
pub const QUESTION_FRAMES: &[&str] = &[
    "Para continuarmos, poderia me dizer {question}?",
    "Agora, me diga: {question}?",
    "E sobre {question}, o que você me conta?",
    "Continuando, {question}?",
];

/// Templates with a `{submodule}` placeholder.
pub const REFLECTIONS: &[&str] = &[
    "E aí, o que você achou de {submodule}? Alguma dúvida ou insight?",
    "Pensando sobre {submodule}, qual a sua opinião sobre isso?",
    "Com base no que vimos sobre {submodule}, você consegue pensar em algum exemplo prático?",
    "Como você poderia aplicar o que aprendeu sobre {submodule} no seu contexto na UVV?",
];

pub const CORRECT_ANSWER: &[&str] = &[
    "Correto! 🎉 Você ganhou 10 pontos!",
    "Excelente! ✅ +10 pontos para você!",
    "Perfeito! 👍 10 pontos adicionados.",
];

/// Templates with an `{answer}` placeholder.
pub const WRONG_ANSWER: &[&str] = &[
    "Não é bem isso... A resposta correta é: {answer}",
    "Quase lá! Na verdade, a resposta correta é: {answer}",
    "Vamos revisar isso. A resposta correta é: {answer}",
];

pub const GENERATION_ERRORS: &[&str] = &[
    "Desculpe, ocorreu um erro. Vamos tentar novamente?",
    "Ops! Algo deu errado. Pode repetir, por favor?",
    "Tive um pequeno problema. Vamos tentar de novo?",
];

pub const CALL_TO_ACTION: &str = "Digite 'continuar' quando quiser avançar para o próximo conteúdo. Fique à vontade para fazer qualquer pergunta se ainda não estiver pronto para avançar.";

pub const ONBOARDING_FALLBACK: &str =
    "Ótimo! Agora que conheço você melhor, vamos começar o curso!";

pub const ONBOARDING_PENDING: &str =
    "Antes de começarmos o curso, preciso conhecer você um pouco melhor.";

pub const COURSE_COMPLETED: &str = "🎓 Parabéns! Você completou o curso de empreendedorismo! Agora você está preparado para iniciar sua jornada empreendedora. Se quiser discutir suas ideias, digite 'mentoria' para solicitar uma sessão.";

pub const QUIZ_UNAVAILABLE: &str =
    "Desculpe, não consegui gerar um quiz neste momento. Tente novamente mais tarde.";

pub const MENTORING_NOT_YET: &str = "Você só pode solicitar mentoria quando chegar ao módulo de Mentoria. Continue avançando no curso!";

pub const GENERIC_FAILURE: &str =
    "Desculpe, ocorreu um erro no sistema. Por favor, tente novamente mais tarde.";

pub const HELP: &str = "📚 *Comandos disponíveis*
- *continuar* ou *próximo*: Avançar para o próximo conteúdo
- *quiz*: Testar seus conhecimentos com um quiz
- *pontos*: Verificar sua pontuação atual
- *mentoria*: Solicitar uma mentoria (disponível a partir do módulo de Mentoria)
- *módulo*: Ver em qual módulo você está
Você também pode fazer qualquer pergunta sobre empreendedorismo a qualquer momento!";

/// A random entry of `bank`.
pub fn pick(bank: &[&'static str]) -> &'static str {
    bank.choose(&mut rand::rng()).copied().unwrap_or_default()
}

pub fn question(text: &str) -> String {
    pick(QUESTION_FRAMES).replace("{question}", text)
}

pub fn reflection(submodule: &str) -> String {
    pick(REFLECTIONS).replace("{submodule}", submodule)
}

pub fn wrong_answer(key: char) -> String {
    pick(WRONG_ANSWER).replace("{answer}", &key.to_string())
}

pub fn transition_fallback(from: &str, to: &str) -> String {
    format!(
        "Parabéns! Você completou o módulo \"{}\"! Agora vamos para \"{}\".",
        from, to
    )
}

pub fn content_unavailable(submodule: &str) -> String {
    format!(
        "Desculpe, tive um problema ao gerar o conteúdo sobre {}. Digite 'continuar' para tentar novamente.",
        submodule
    )
}

pub fn points(balance: u32) -> String {
    format!(
        "Você tem {} pontos. 🏆\n\nContinue respondendo quizzes para ganhar mais pontos!",
        balance
    )
}

pub fn mentoring_redeemed(remaining: u32) -> String {
    format!(
        "Parabéns! 🎉 Você resgatou uma mentoria. Entraremos em contato para agendar. Seus pontos restantes: {}",
        remaining
    )
}

pub fn mentoring_insufficient(balance: u32, cost: u32) -> String {
    format!(
        "Você precisa de {} pontos para solicitar uma mentoria, mas só tem {} pontos. Continue respondendo aos quizzes para ganhar mais pontos!",
        cost, balance
    )
}

/// `position` is the 1-based submodule number and title, `None` once the module is done.
pub fn progress(module: &str, position: Option<(usize, usize, &str)>, balance: u32) -> String {
    match position {
        Some((n, total, submodule)) => format!(
            "📍 Você está no módulo *{}*, tópico {} de {}: {}.\nPontos: {}",
            module, n, total, submodule, balance
        ),
        None => format!(
            "📍 Você concluiu o módulo *{}*.\nPontos: {}",
            module, balance
        ),
    }
}

pub fn quiz_header(module: &str, question: &str) -> String {
    format!("*Quiz do módulo {}*\n\n{}", module, question)
}

pub fn quiz_finished(feedback: &str, balance: u32) -> String {
    format!(
        "{}\n\n🎯 Quiz concluído! Você tem agora {} pontos.",
        feedback, balance
    )
}

pub fn next_question(feedback: &str, question: &str) -> String {
    format!("{}\n\n*Próxima pergunta:*\n\n{}", feedback, question)
}

pub fn invalid_option(keys: &str) -> String {
    format!(
        "Por favor, responda com a letra da alternativa ({}).",
        keys
    )
}
